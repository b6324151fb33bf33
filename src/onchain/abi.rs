//! Contract ABI for the watched token.
//!
//! Only the two members the bot touches are declared: the `Mint` event it
//! listens for and the `burn` function it calls in response.

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract MintBurnToken {
        event Mint(address receiver, uint256 amount);

        function burn(address receiver, uint256 amount) public;
    }
}

pub use MintBurnToken::Mint;
