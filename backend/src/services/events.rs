//! Library change events
//!
//! Sent on the ingestion service's broadcast channel after the owning
//! transaction commits. Nobody listening is fine; sends are best effort.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the event channel; slow subscribers see `Lagged`
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibraryEvent {
    ShowAdded {
        library_id: Uuid,
        show_id: i64,
        name: String,
        placeholder: bool,
    },
    SeasonAdded {
        library_id: Uuid,
        show_id: i64,
        season_number: i64,
    },
    EpisodeAdded {
        library_id: Uuid,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
        episode_id: i64,
    },
    EpisodeRemoved {
        library_id: Uuid,
        show_id: i64,
        episode_id: i64,
    },
    SeasonRemoved {
        library_id: Uuid,
        show_id: i64,
        season_number: i64,
    },
    ShowRemoved {
        library_id: Uuid,
        show_id: i64,
    },
}

impl LibraryEvent {
    pub fn library_id(&self) -> Uuid {
        match self {
            LibraryEvent::ShowAdded { library_id, .. }
            | LibraryEvent::SeasonAdded { library_id, .. }
            | LibraryEvent::EpisodeAdded { library_id, .. }
            | LibraryEvent::EpisodeRemoved { library_id, .. }
            | LibraryEvent::SeasonRemoved { library_id, .. }
            | LibraryEvent::ShowRemoved { library_id, .. } => *library_id,
        }
    }
}

pub(crate) fn emit(tx: &broadcast::Sender<LibraryEvent>, event: LibraryEvent) {
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let library_id = Uuid::nil();
        let event = LibraryEvent::ShowRemoved {
            library_id,
            show_id: 4,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "show_removed");
        assert_eq!(json["show_id"], 4);
        assert_eq!(event.library_id(), library_id);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let (tx, _) = broadcast::channel(4);
        emit(
            &tx,
            LibraryEvent::SeasonAdded {
                library_id: Uuid::new_v4(),
                show_id: 1,
                season_number: 1,
            },
        );
    }
}
