use serde::{Deserialize, Serialize};

use timeledger_core::types::{CenterId, OfferingId, RoomId};

/// A class or service a center runs on a weekly basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub id: OfferingId,
    pub center_id: CenterId,
    pub name: String,
    #[serde(default)]
    pub default_room_id: Option<RoomId>,
}
