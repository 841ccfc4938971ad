//! Definitions of Solidity functions called during deployment, upgrades and
//! pool administration

use alloy::sol;

sol! {
    /// The slice of the MetaNode staking contract the scripts interact with
    #[sol(rpc)]
    interface IMetaNodeStake {
        function initialize(
            address _MetaNode,
            uint256 _startBlock,
            uint256 _endBlock,
            uint256 _MetaNodePerBlock
        ) external;

        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;

        function addPool(
            address _stTokenAddress,
            uint256 _poolWeight,
            uint256 _minDepositAmount,
            uint256 _unstakeLockedBlocks,
            bool _withUpdate
        ) external;
        function depositETH() external payable;

        function MetaNode() external view returns (address);
        function startBlock() external view returns (uint256);
        function endBlock() external view returns (uint256);
        function MetaNodePerBlock() external view returns (uint256);
        function withdrawPaused() external view returns (bool);
        function claimPaused() external view returns (bool);
        function totalPoolWeight() external view returns (uint256);
        function poolLength() external view returns (uint256);
        function pool(uint256 pid)
            external
            view
            returns (
                address stTokenAddress,
                uint256 poolWeight,
                uint256 lastRewardBlock,
                uint256 accMetaNodePerST,
                uint256 stTokenAmount,
                uint256 minDepositAmount,
                uint256 unstakeLockedBlocks
            );
    }
}
