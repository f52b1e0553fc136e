use {
    crate::{amount::Amount, identity::Party, ids::LinearId},
    chrono::{DateTime, Duration, Utc},
    serde::{Deserialize, Serialize},
};

/// An active Dutch auction selling exactly one locked asset.
///
/// The price starts at [`Self::price`] and decays by [`Self::decrement`]
/// every [`Self::period`] from [`Self::start_time`]. The auction ends when
/// one of the [`Self::bidders`] bids at the current price, or when the owner
/// ends it manually. The auction references the asset by id rather than
/// embedding a copy; an embedded copy could silently go stale against the
/// live asset record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionState {
    pub asset_id: LinearId,
    pub owner: Party,
    pub bidders: Vec<Party>,
    pub price: Amount,
    pub decrement: Amount,
    #[serde(with = "duration_millis")]
    pub period: Duration,
    pub start_time: DateTime<Utc>,
    pub id: LinearId,
}

impl AuctionState {
    pub fn new(
        asset_id: LinearId,
        owner: Party,
        bidders: Vec<Party>,
        price: Amount,
        decrement: Amount,
        period: Duration,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_id,
            owner,
            bidders,
            price,
            decrement,
            period,
            start_time,
            id: LinearId::random(),
        }
    }

    pub fn with_price(self, price: Amount) -> Self {
        Self { price, ..self }
    }

    pub fn is_bidder(&self, party: &Party) -> bool {
        self.bidders.contains(party)
    }

    /// Everyone with a stake in the auction: the bidders plus the owner.
    pub fn participants(&self) -> Vec<Party> {
        let mut parties = self.bidders.clone();
        parties.push(self.owner.clone());
        parties
    }
}

/// Serializes a duration as integer milliseconds, the unit the price
/// schedule is defined in.
mod duration_millis {
    use {
        chrono::Duration,
        serde::{Deserialize, Deserializer, Serialize, Serializer, de},
    };

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.num_milliseconds().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Duration::try_milliseconds(millis)
            .ok_or_else(|| de::Error::custom("duration out of range"))
    }
}
