// ==================== PAST EVENT SWEEPER ====================
// Moves upcoming events whose date has passed to `completed`.

use crate::{database::MongoDB, services::event_service};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Spawns the sweeper. The first tick fires immediately, so a restart after
/// downtime catches up on startup; later runs follow `every`.
pub async fn start_event_sweeper(db: MongoDB, every: Duration) {
    log::info!("🧹 Starting event sweeper (runs every {}s)", every.as_secs());

    tokio::spawn(async move {
        let mut interval = interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            run_once(&db).await;
        }
    });

    log::info!("✅ Event sweeper started successfully");
}

async fn run_once(db: &MongoDB) {
    match event_service::sweep_past_events(db).await {
        Ok(0) => log::debug!("🧹 Event sweep: nothing to complete"),
        Ok(count) => log::info!("🧹 Event sweep: {} past events marked completed", count),
        Err(e) => log::error!("❌ Event sweep failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::collections;
    use crate::models::{Event, EventCreator, EventStatus, Role};
    use crate::test_support::test_db;
    use mongodb::bson::{doc, DateTime as BsonDateTime};

    fn event(title: &str, date: BsonDateTime, status: EventStatus) -> Event {
        Event {
            id: None,
            title: title.to_string(),
            description: "desc".to_string(),
            date,
            venue: "Main hall".to_string(),
            capacity: None,
            status,
            image_url: None,
            created_by: EventCreator {
                uid: "alum-1".to_string(),
                role: Role::Alumni,
                name: "Alum".to_string(),
            },
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        }
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn sweep_completes_only_past_upcoming_events() {
        let db = test_db().await;
        let day_ms = 24 * 60 * 60 * 1000;
        let now = BsonDateTime::now().timestamp_millis();
        let events = db.collection::<Event>(collections::EVENTS);
        events
            .insert_many(vec![
                event("past", BsonDateTime::from_millis(now - day_ms), EventStatus::Upcoming),
                event("future", BsonDateTime::from_millis(now + day_ms), EventStatus::Upcoming),
                event("cancelled", BsonDateTime::from_millis(now - day_ms), EventStatus::Cancelled),
            ])
            .await
            .unwrap();

        run_once(&db).await;

        let status_of = |title: &'static str| {
            let events = events.clone();
            async move {
                events
                    .find_one(doc! { "title": title })
                    .await
                    .unwrap()
                    .unwrap()
                    .status
            }
        };
        assert_eq!(status_of("past").await, EventStatus::Completed);
        assert_eq!(status_of("future").await, EventStatus::Upcoming);
        assert_eq!(status_of("cancelled").await, EventStatus::Cancelled);
    }
}
