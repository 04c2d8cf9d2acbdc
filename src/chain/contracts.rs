//! Solidity bindings for the contracts the keeper reads and calls.
//!
//! Only the methods the keeper touches are declared. Calldata for writes is
//! produced from the generated `*Call` structs, reads go through the
//! `#[sol(rpc)]` instances.

use alloy::sol;

sol! {
    /// Vault: collateral pool, SKR issuance and the global settlement switch.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Tub {
        function gem() external view returns (address);
        function skr() external view returns (address);
        function sai() external view returns (address);
        function pip() external view returns (address);
        function per() external view returns (uint256);
        function off() external view returns (bool);
        function join(uint256 wad) external;
        function exit(uint256 wad) external;
    }

    /// Liquidator: sells surplus Sai for SKR and buys back bad debt.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Tap {
        function s2s() external view returns (uint256);
        function gap() external view returns (uint256);
        function joy() external view returns (uint256);
        function woe() external view returns (uint256);
        function fog() external view returns (uint256);
        function boom(uint256 wad) external;
        function bust(uint256 wad) external;
    }

    /// OASIS matching market.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Otc {
        function last_offer_id() external view returns (uint256);
        function offers(uint256 id) external view returns (
            uint256 pay_amt,
            address pay_gem,
            uint256 buy_amt,
            address buy_gem,
            address owner,
            uint64 timestamp
        );
        function take(bytes32 id, uint128 maxTakeAmount) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Price feed behind `Tub::pip`.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract DSValue {
        function peek() external view returns (bytes32 value, bool has);
    }

    /// Batch executor: pulls `tokens` from the caller, runs the invocations in
    /// order and returns every token balance. Any failing invocation reverts
    /// the whole call.
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract TxManager {
        struct Invocation {
            address target;
            bytes callData;
        }

        function execute(address[] tokens, Invocation[] invocations) external;
    }
}
