use std::sync::Arc;

use tokio::sync::RwLock;

use crate::app::model::ChartSnapshot;

#[derive(Debug)]
pub struct ChartStore {
    current: RwLock<Arc<ChartSnapshot>>,
}

impl ChartStore {
    pub fn new(initial: ChartSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub async fn snapshot(&self) -> Arc<ChartSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    pub async fn replace(&self, next: ChartSnapshot) -> Arc<ChartSnapshot> {
        let next = Arc::new(next);
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::MovieRecord;

    fn snapshot(names: &[&str]) -> ChartSnapshot {
        let mut snapshot = ChartSnapshot::failed("test", "none");
        snapshot.error = None;
        snapshot.records = names
            .iter()
            .enumerate()
            .map(|(i, name)| MovieRecord {
                rank: i as u32 + 1,
                url: format!("https://www.imdb.com/title/tt{i}/"),
                name: (*name).to_owned(),
                alternate_name: None,
                description: None,
                image: None,
                rating_value: None,
                rating_count: None,
                content_rating: None,
                genre: Vec::new(),
                duration: None,
            })
            .collect();
        snapshot
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_across_replace() {
        let store = ChartStore::new(snapshot(&["a", "b"]));
        let held = store.snapshot().await;

        let previous = store.replace(snapshot(&["c"])).await;
        assert!(Arc::ptr_eq(&held, &previous));

        assert_eq!(held.records.len(), 2);
        let current = store.snapshot().await;
        assert_eq!(current.records.len(), 1);
        assert_eq!(current.records[0].name, "c");
    }
}
