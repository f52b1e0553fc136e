use {
    crate::{
        amount::Amount,
        asset::AuctionableAsset,
        auction::AuctionState,
        identity::{Party, PublicKey},
        ids::TxHash,
    },
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
    std::{collections::BTreeSet, fmt},
};

/// A transfer of the external payment instrument to a holder.
///
/// The engine only inspects these outputs to check that a winning bid pays
/// the auction owner enough; the instrument itself (issuance, change,
/// balance tracking) lives outside this system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub holder: Party,
    pub amount: Amount,
}

/// The closed set of state types a transaction may carry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum OutputState {
    Asset(AuctionableAsset),
    Auction(AuctionState),
    Tokens(TokenTransfer),
}

impl OutputState {
    pub fn as_asset(&self) -> Option<&AuctionableAsset> {
        match self {
            Self::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_auction(&self) -> Option<&AuctionState> {
        match self {
            Self::Auction(auction) => Some(auction),
            _ => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&TokenTransfer> {
        match self {
            Self::Tokens(tokens) => Some(tokens),
            _ => None,
        }
    }
}

/// Pointer to the `index`-th output of the transaction identified by
/// `txhash`. The notary's double-spend protection is keyed by these.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StateRef {
    pub txhash: TxHash,
    pub index: u32,
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.txhash, self.index)
    }
}

impl fmt::Debug for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StateRef({self})")
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum AssetCommand {
    Issue,
    Transfer,
    Consume,
    Lock,
    Unlock,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum AuctionCommand {
    Create,
    Decrease,
    End,
    Bid,
}

/// A transaction's intent, split by the engine that verifies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
pub enum CommandKind {
    Asset(AssetCommand),
    Auction(AuctionCommand),
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Asset(command) => write!(f, "Asset.{command}"),
            Self::Auction(command) => write!(f, "Auction.{command}"),
        }
    }
}

/// A command together with the keys that are required to sign for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub signers: BTreeSet<PublicKey>,
}

impl Command {
    pub fn new(kind: impl Into<CommandKind>, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            kind: kind.into(),
            signers: signers.into_iter().collect(),
        }
    }
}

/// Attested bounds on the real time at which a transaction is notarized;
/// lower bound inclusive, upper bound exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn from_only(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: None,
        }
    }
}

/// The full bundle the verification engines judge: consumed inputs with
/// their refs, produced outputs, commands with required signers, and an
/// optional time window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub inputs: Vec<(StateRef, OutputState)>,
    pub outputs: Vec<OutputState>,
    pub commands: Vec<Command>,
    pub time_window: Option<TimeWindow>,
}

impl LedgerTransaction {
    /// Deterministic content hash; signatures are not part of the identity.
    pub fn hash(&self) -> TxHash {
        let bytes = serde_json::to_vec(self).expect("transaction serializes");
        TxHash(Sha256::digest(&bytes).into())
    }

    pub fn input_states(&self) -> impl Iterator<Item = &OutputState> {
        self.inputs.iter().map(|(_, state)| state)
    }

    pub fn input_assets(&self) -> Vec<&AuctionableAsset> {
        self.input_states().filter_map(OutputState::as_asset).collect()
    }

    pub fn output_assets(&self) -> Vec<&AuctionableAsset> {
        self.outputs.iter().filter_map(OutputState::as_asset).collect()
    }

    pub fn input_auctions(&self) -> Vec<&AuctionState> {
        self.input_states().filter_map(OutputState::as_auction).collect()
    }

    pub fn output_auctions(&self) -> Vec<&AuctionState> {
        self.outputs.iter().filter_map(OutputState::as_auction).collect()
    }

    pub fn output_tokens(&self) -> Vec<&TokenTransfer> {
        self.outputs.iter().filter_map(OutputState::as_tokens).collect()
    }

    pub fn asset_commands(&self) -> Vec<(&AssetCommand, &BTreeSet<PublicKey>)> {
        self.commands
            .iter()
            .filter_map(|command| match &command.kind {
                CommandKind::Asset(kind) => Some((kind, &command.signers)),
                CommandKind::Auction(_) => None,
            })
            .collect()
    }

    pub fn auction_commands(&self) -> Vec<(&AuctionCommand, &BTreeSet<PublicKey>)> {
        self.commands
            .iter()
            .filter_map(|command| match &command.kind {
                CommandKind::Auction(kind) => Some((kind, &command.signers)),
                CommandKind::Asset(_) => None,
            })
            .collect()
    }

    /// The union of every command's required signers. The notary requires a
    /// signature for each of these before finalizing.
    pub fn required_signers(&self) -> BTreeSet<PublicKey> {
        self.commands
            .iter()
            .flat_map(|command| command.signers.iter().copied())
            .collect()
    }

    pub fn sign(self, key: PublicKey) -> SignedTransaction {
        SignedTransaction {
            tx: self,
            signatures: BTreeSet::from([key]),
        }
    }
}

/// Incrementally assembles a [`LedgerTransaction`].
#[derive(Default)]
pub struct TransactionBuilder {
    inputs: Vec<(StateRef, OutputState)>,
    outputs: Vec<OutputState>,
    commands: Vec<Command>,
    time_window: Option<TimeWindow>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, reference: StateRef, state: impl Into<OutputState>) -> Self {
        self.inputs.push((reference, state.into()));
        self
    }

    pub fn output(mut self, state: impl Into<OutputState>) -> Self {
        self.outputs.push(state.into());
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn build(self) -> LedgerTransaction {
        LedgerTransaction {
            inputs: self.inputs,
            outputs: self.outputs,
            commands: self.commands,
            time_window: self.time_window,
        }
    }
}

/// A transaction plus the keys that have signed it so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: LedgerTransaction,
    pub signatures: BTreeSet<PublicKey>,
}

impl SignedTransaction {
    pub fn hash(&self) -> TxHash {
        self.tx.hash()
    }

    pub fn with_signature(mut self, key: PublicKey) -> Self {
        self.signatures.insert(key);
        self
    }

    pub fn missing_signers(&self) -> BTreeSet<PublicKey> {
        self.tx
            .required_signers()
            .difference(&self.signatures)
            .copied()
            .collect()
    }
}
