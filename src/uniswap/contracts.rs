//! Solidity bindings for the Uniswap V3 contracts the scout reads and
//! simulates against.

#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IUniswapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }

    #[sol(rpc)]
    interface IUniswapV3Pool {
        function liquidity() external view returns (uint128 liquidity);
    }

    #[sol(rpc)]
    interface IQuoterV2 {
        function quoteExactInput(bytes memory path, uint256 amountIn)
            external
            returns (
                uint256 amountOut,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate
            );

        function quoteExactOutput(bytes memory path, uint256 amountOut)
            external
            returns (
                uint256 amountIn,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate
            );
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ISwapRouter {
        struct ExactInputParams {
            bytes path;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
        }

        struct ExactOutputParams {
            bytes path;
            address recipient;
            uint256 deadline;
            uint256 amountOut;
            uint256 amountInMaximum;
        }

        function exactInput(ExactInputParams calldata params) external payable returns (uint256 amountOut);

        function exactOutput(ExactOutputParams calldata params) external payable returns (uint256 amountIn);
    }
}
