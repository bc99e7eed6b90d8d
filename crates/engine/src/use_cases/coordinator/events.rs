//! Session -> server event conversions.

use metaverse_domain::{Session, SpaceGeometry};
use metaverse_shared::{ElementData, OccupantData, ServerMessage};

pub(super) fn space_joined(
    session: &Session,
    geometry: &SpaceGeometry,
    occupants: &[Session],
) -> ServerMessage {
    ServerMessage::SpaceJoined {
        space_id: session.space_id().to_string(),
        session_id: session.id().to_uuid(),
        user_id: session.identity().to_string(),
        spawn: session.position().into(),
        dimensions: geometry.dimensions().into(),
        elements: geometry.elements().iter().map(ElementData::from).collect(),
        occupants: occupants.iter().map(OccupantData::from).collect(),
    }
}

pub(super) fn user_joined(session: &Session) -> ServerMessage {
    let position = session.position();
    ServerMessage::UserJoined {
        session_id: session.id().to_uuid(),
        user_id: session.identity().to_string(),
        identity: session.identity().to_string(),
        x: position.x,
        y: position.y,
    }
}

pub(super) fn movement(session: &Session) -> ServerMessage {
    let position = session.position();
    ServerMessage::Movement {
        session_id: session.id().to_uuid(),
        user_id: session.identity().to_string(),
        x: position.x,
        y: position.y,
    }
}

pub(super) fn user_left(session: &Session) -> ServerMessage {
    ServerMessage::UserLeft {
        session_id: session.id().to_uuid(),
        user_id: session.identity().to_string(),
        identity: session.identity().to_string(),
    }
}
