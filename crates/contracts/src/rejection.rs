use thiserror::Error;

/// The externally observable failure taxonomy of the verification engines.
///
/// The display strings are the contract: flows surface them verbatim to
/// initiators and tests assert on them, so changing a message is a breaking
/// change.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    // Command cardinality.
    #[error("exactly one asset command is required")]
    AssetCommandCardinality,
    #[error("exactly one auction command is required")]
    AuctionCommandCardinality,

    // Asset: Issue.
    #[error("no inputs should be consumed when issuing an asset")]
    IssueHasInputs,
    #[error("only one output state should be created when issuing an asset")]
    IssueOutputCount,
    #[error("the asset must have a description")]
    EmptyDescription,
    #[error("the issuer must sign")]
    IssuerMustSign,

    // Asset: Transfer.
    #[error("a transfer transaction should only consume one input state")]
    TransferInputCount,
    #[error("a transfer transaction should only create one output state")]
    TransferOutputCount,
    #[error("only the owner property may change")]
    OnlyOwnerMayChange,
    #[error("the owner property must change in a transfer")]
    OwnerMustChange,
    #[error("the old owner must sign")]
    OldOwnerMustSign,

    // Asset: Consume.
    #[error("a consume transaction should only consume one input state")]
    ConsumeInputCount,
    #[error("a consume transaction should have no output states")]
    ConsumeHasOutputs,
    #[error("the owner and issuer must sign")]
    OwnerAndIssuerMustSign,

    // Asset: shared lock discipline.
    #[error("the asset must be unlocked")]
    AssetLocked,

    // Asset: Lock.
    #[error("a lock transaction must have one input asset")]
    LockInputCount,
    #[error("a lock transaction must have one output asset")]
    LockOutputCount,
    #[error("the output asset must be locked")]
    OutputNotLocked,
    #[error("only the lock property may change")]
    OnlyLockMayChange,
    #[error("a lock must be paired with an auction create command")]
    LockWithoutCreate,
    #[error("must have an output auction")]
    MissingAuctionOutput,

    // Asset: Unlock.
    #[error("an unlock transaction must have one input asset")]
    UnlockInputCount,
    #[error("an unlock transaction must have one output asset")]
    UnlockOutputCount,
    #[error("the input asset must be locked")]
    AssetNotLocked,
    #[error("the output asset must be unlocked")]
    OutputStillLocked,
    #[error("only the lock property and owner may change")]
    OnlyLockAndOwnerMayChange,
    #[error("the new owner must sign")]
    NewOwnerMustSign,
    #[error("an unlock must be paired with an auction end or bid command")]
    UnlockWithoutTerminalCommand,
    #[error("must have an input auction")]
    MissingAuctionInput,

    // Shared between the engines.
    #[error("the auction must reference the correct asset")]
    WrongAssetReference,
    #[error("the owner must sign")]
    OwnerMustSign,

    // Auction: Create.
    #[error("no auction inputs should be consumed when creating an auction")]
    CreateHasAuctionInputs,
    #[error("only one auction output state should be created when creating an auction")]
    CreateOutputCount,
    #[error("the owner must not be a bidder")]
    OwnerIsBidder,
    #[error("there must be at least one bidder")]
    NoBidders,
    #[error("the start price should be greater than zero")]
    StartPriceNotPositive,
    #[error("the decrement must be greater than zero")]
    DecrementNotPositive,
    #[error("the period must be greater than zero")]
    PeriodNotPositive,
    #[error("a create must be paired with an asset lock command")]
    CreateWithoutLock,
    #[error("the owner and all bidders must sign")]
    AllParticipantsMustSign,

    // Auction: Decrease.
    #[error("an auction decrease transaction must have one input state")]
    DecreaseInputCount,
    #[error("an auction decrease transaction must have one output state")]
    DecreaseOutputCount,
    #[error("only the price may change")]
    OnlyPriceMayChange,
    #[error("the price must decrease")]
    PriceMustDecrease,
    #[error("the new price must be greater than zero")]
    NewPriceNotPositive,
    #[error("the token type of the price may not change")]
    TokenMismatch,

    // Auction: End.
    #[error("an end auction transaction must have one input state")]
    EndInputCount,
    #[error("an end auction transaction must have no outputs")]
    EndHasOutputs,

    // Auction: Bid.
    #[error("a bid transaction must have one input state")]
    BidInputCount,
    #[error("a bid transaction must have no outputs")]
    BidHasOutputs,
    #[error("the transaction must be time windowed")]
    MissingTimeWindow,
    #[error("the time window is inconsistent with the amount paid")]
    StaleTimeWindow,
    #[error("insufficient payment to the auction owner")]
    InsufficientPayment,
    #[error("the signer must be a bidder")]
    MustBeBidder,
    #[error("an end or bid must be paired with an asset unlock command")]
    TerminalWithoutUnlock,
}
