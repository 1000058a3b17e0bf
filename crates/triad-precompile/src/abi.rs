//! ABI surface for the four precompiles, via `alloy_sol_types::sol!`. The
//! macro derives bit-exact method selectors (keccak256 of the canonical
//! signature) and typed encode/decode for every call and event listed in
//! the external interfaces.

use alloy_sol_types::sol;

sol! {
    interface RideHail {
        function version() external view returns (uint256);

        function validateCreateRequest(
            bytes32 cellTopic,
            bytes32 regionTopic,
            bytes32 paramsHash,
            bytes32 pickupCommit,
            bytes32 dropoffCommit,
            uint64 maxDriverEta,
            uint64 ttl
        ) external view returns (bool, string memory);

        function nextRequestId() external view returns (uint256);
        function nextSessionId() external view returns (uint256);

        function createRequest(
            bytes32 cellTopic,
            bytes32 regionTopic,
            bytes32 paramsHash,
            bytes32 pickupCommit,
            bytes32 dropoffCommit,
            uint64 maxDriverEta,
            uint64 ttl
        ) external payable returns (uint256);

        function acceptCommit(uint256 requestId, bytes32 commitHash, uint64 eta) external payable;

        function acceptReveal(uint256 requestId, uint64 eta, bytes32 driverCell, bytes32 salt) external;

        function updateCoarseLocation(uint256 sessionId, bytes32 cell) external;

        function requests(uint256 requestId)
            external
            view
            returns (
                uint256 requestId,
                address rider,
                bytes32 cellTopic,
                bytes32 regionTopic,
                bytes32 paramsHash,
                bytes32 pickupCommit,
                bytes32 dropoffCommit,
                uint64 maxDriverEta,
                uint64 createdAt,
                uint64 commitEnd,
                uint64 revealEnd,
                uint64 expiresAt,
                uint256 riderDeposit,
                bool matched,
                uint256 sessionId,
                bool exists
            );

        function postEncryptedMessage(
            uint256 sessionId,
            uint32 msgIndex,
            bytes calldata header,
            bytes calldata ciphertext
        ) external payable;

        event SponsorshipCreated(bytes32 indexed id, address indexed sponsor, address indexed beneficiary, uint64 budget);
        event SponsorshipUsed(bytes32 indexed id, address indexed beneficiary, uint64 gasUsed);
        event SponsorshipCancelled(bytes32 indexed id, uint64 refund);
        event RideRequested(uint256 indexed requestId, address indexed rider);
        event DriverAcceptCommitted(uint256 indexed requestId, address indexed driver);
        event DriverAcceptRevealed(uint256 indexed requestId, address indexed driver);
        event Matched(uint256 indexed sessionId, uint256 indexed requestId, address rider, address driver, uint64 eta);
        event EncryptedMessage(uint256 indexed sessionId, address indexed sender, uint64 msgIndex, bytes header, bytes ciphertext);
        event StateChanged(uint256 indexed sessionId, uint8 newState, uint64 timestamp);
        event CoarseLocationUpdated(uint256 indexed sessionId, address indexed sender, bytes32 cell);
    }

    interface KeyRegistry {
        function publishKeysV2(
            bytes32 identityX25519Pub,
            bytes32 identityEd25519Pub,
            bytes32 signedPrekeyPub,
            bytes calldata signature,
            uint64 expiresAt
        ) external;

        function getKeys(address owner)
            external
            view
            returns (
                bytes32 identityX25519Pub,
                bytes32 identityEd25519Pub,
                bytes32 signedPrekeyPub,
                bytes memory signature,
                uint64 expiresAt,
                bool exists
            );
    }

    interface FeeSponsor {
        function createSponsorship(
            address beneficiary,
            uint64 maxGasPerTx,
            uint64 totalGasBudget,
            uint64 expirationHeight
        ) external returns (bytes32);

        function createSponsorshipWithConditions(
            address beneficiary,
            uint64 maxGasPerTx,
            uint64 totalGasBudget,
            uint64 expirationHeight,
            address[] calldata whitelistedContracts,
            uint128 maxTxValue,
            uint64 dailyGasLimit
        ) external returns (bytes32);

        function cancelSponsorship(bytes32 id) external;

        function getSponsorship(bytes32 id)
            external
            view
            returns (
                address sponsor,
                address beneficiary,
                uint64 maxGasPerTx,
                uint64 totalGasBudget,
                uint64 expirationHeight,
                bool isActive,
                uint64 gasUsed,
                uint64 transactionCount,
                bool exists
            );

        function getSponsorshipsFor(address beneficiary) external view returns (bytes32[] memory);

        function isSponsored(
            address beneficiary,
            uint64 gasLimit,
            address targetContract,
            uint256 txValue
        ) external view returns (bool);
    }

    interface EnvelopeValidator {
        function validateEnvelope(
            bytes calldata header,
            bytes calldata ciphertext,
            uint32 maxHeaderBytes,
            uint32 maxCiphertextBytes
        )
            external
            pure
            returns (
                bool valid,
                bytes32 envelopeHash,
                uint8 version,
                bytes32 dhPub,
                uint32 pn,
                uint32 n,
                bytes32 adHash
            );
    }
}
