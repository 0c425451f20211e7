use serde::Serialize;
use spotmap_core::models::{
    EntityKind, ListingSnapshot, LocationId, QueryParams, SortDirection, SortKey, WireLocation,
};

/// A change the user asks the listing for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingIntent {
    SwitchKind(EntityKind),
    Search(String),
    Sort(SortKey, SortDirection),
    GoToPage(u32),
}

/// What the console currently shows, per entity kind
#[derive(Debug, Clone, Serialize)]
pub struct ListingState {
    active: EntityKind,
    params: [QueryParams; 3],
    snapshots: [Option<ListingSnapshot>; 3],
}

impl ListingState {
    pub fn new(page_size: u32) -> Self {
        Self {
            active: EntityKind::default(),
            params: EntityKind::ALL.map(|kind| QueryParams::new(kind, page_size)),
            snapshots: [None, None, None],
        }
    }

    pub fn active_kind(&self) -> EntityKind {
        self.active
    }

    /// Params most recently selected for a kind
    pub fn params(&self, kind: EntityKind) -> &QueryParams {
        &self.params[kind.index()]
    }

    /// Params that follow from an intent on the active kind.
    ///
    /// Changing kind or search text goes back to page 1.
    pub fn next_params(&self, intent: ListingIntent) -> QueryParams {
        let current = self.params(self.active).clone();
        match intent {
            ListingIntent::SwitchKind(kind) if kind == self.active => current,
            ListingIntent::SwitchKind(kind) => self.params(kind).clone().at_page(1),
            ListingIntent::Search(text) if text == current.search => current,
            ListingIntent::Search(text) => current.with_search(text).at_page(1),
            ListingIntent::Sort(key, direction) => current.sorted_by(key, direction),
            ListingIntent::GoToPage(page) => current.at_page(page.max(1)),
        }
    }

    /// Send params that change kind or search text back to page 1 when they
    /// still carry the page of the listing on display.
    ///
    /// An explicitly chosen page (one that differs from the displayed page)
    /// is kept, so callers may build params directly instead of going
    /// through `next_params`.
    pub fn reset_carried_page(&self, params: QueryParams) -> QueryParams {
        let current = self.params(self.active);
        let changed = params.kind != self.active || params.search.trim() != current.search.trim();
        if changed && params.page == current.page && params.page != 1 {
            tracing::debug!(kind = %params.kind, page = params.page, "Resetting carried page");
            params.at_page(1)
        } else {
            params
        }
    }

    /// Record the params a request is about to be issued with.
    ///
    /// Returns true when this switched the active kind, in which case every
    /// other kind's rows are cleared.
    pub fn select(&mut self, params: QueryParams) -> bool {
        let kind = params.kind;
        let switched = kind != self.active;
        if switched {
            tracing::debug!(from = %self.active, to = %kind, "Switching active kind");
            self.active = kind;
            for other in EntityKind::ALL.into_iter().filter(|k| *k != kind) {
                self.snapshots[other.index()] = None;
            }
        }
        self.params[kind.index()] = params;
        switched
    }

    /// Install a fetched snapshot; ignored unless its kind is active
    pub fn apply(&mut self, snapshot: ListingSnapshot) -> bool {
        let kind = snapshot.params.kind;
        if kind != self.active {
            tracing::debug!(%kind, active = %self.active, "Ignoring snapshot for inactive kind");
            return false;
        }
        self.snapshots[kind.index()] = Some(snapshot);
        true
    }

    pub fn snapshot(&self, kind: EntityKind) -> Option<&ListingSnapshot> {
        self.snapshots[kind.index()].as_ref()
    }

    pub fn rows(&self, kind: EntityKind) -> &[WireLocation] {
        self.snapshot(kind).map(|s| s.rows.as_slice()).unwrap_or_default()
    }

    pub fn total_pages(&self, kind: EntityKind) -> u64 {
        self.snapshot(kind).map(ListingSnapshot::total_pages).unwrap_or(0)
    }

    /// Page of the rows on display, or of the pending selection when none are
    pub fn current_page(&self, kind: EntityKind) -> u32 {
        self.snapshot(kind).map(|s| s.params.page).unwrap_or_else(|| self.params(kind).page)
    }

    pub fn row(&self, kind: EntityKind, id: &LocationId) -> Option<&WireLocation> {
        self.rows(kind).iter().find(|row| row.id.as_ref() == Some(id))
    }

    /// Optimistically flip a displayed row; returns the previous value
    pub fn set_row_availability(
        &mut self,
        kind: EntityKind,
        id: &LocationId,
        available: bool,
    ) -> Option<bool> {
        let snapshot = self.snapshots[kind.index()].as_mut()?;
        let row = snapshot.rows.iter_mut().find(|row| row.id.as_ref() == Some(id))?;
        Some(std::mem::replace(&mut row.available, available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(params: QueryParams, rows: Vec<WireLocation>, total_count: u64) -> ListingSnapshot {
        ListingSnapshot { rows, total_count, params }
    }

    #[test]
    fn test_search_and_kind_reset_page() {
        let mut state = ListingState::new(20);
        state.select(state.next_params(ListingIntent::GoToPage(4)));
        assert_eq!(state.params(EntityKind::Parking).page, 4);

        let same = state.next_params(ListingIntent::Search(String::new()));
        assert_eq!(same.page, 4);

        let searched = state.next_params(ListingIntent::Search("garage".to_string()));
        assert_eq!(searched.page, 1);
        assert_eq!(searched.search, "garage");

        let sorted = state.next_params(ListingIntent::Sort(SortKey::Name, SortDirection::Ascending));
        assert_eq!(sorted.page, 4);

        let switched = state.next_params(ListingIntent::SwitchKind(EntityKind::Service));
        assert_eq!(switched.kind, EntityKind::Service);
        assert_eq!(switched.page, 1);
    }

    #[test]
    fn test_carried_page_resets_on_search_or_kind_change() {
        let mut state = ListingState::new(20);
        state.select(QueryParams::new(EntityKind::Parking, 20).at_page(4));

        let searched = QueryParams::new(EntityKind::Parking, 20).with_search("garage").at_page(4);
        assert_eq!(state.reset_carried_page(searched).page, 1);

        let switched = QueryParams::new(EntityKind::Service, 20).at_page(4);
        assert_eq!(state.reset_carried_page(switched).page, 1);

        let chosen = QueryParams::new(EntityKind::Parking, 20).with_search("garage").at_page(2);
        assert_eq!(state.reset_carried_page(chosen).page, 2);

        let same_search = QueryParams::new(EntityKind::Parking, 20).with_search(" ").at_page(4);
        assert_eq!(state.reset_carried_page(same_search).page, 4);
    }

    #[test]
    fn test_switching_kind_clears_other_kinds() {
        let mut state = ListingState::new(2);
        let parking = QueryParams::new(EntityKind::Parking, 2);
        state.select(parking.clone());
        assert!(state.apply(snapshot(parking, vec![WireLocation::new(1, "P")], 5)));
        assert_eq!(state.total_pages(EntityKind::Parking), 3);

        let service = state.next_params(ListingIntent::SwitchKind(EntityKind::Service));
        assert!(state.select(service.clone()));
        assert!(state.rows(EntityKind::Parking).is_empty());
        assert_eq!(state.active_kind(), EntityKind::Service);

        let late_parking = snapshot(QueryParams::new(EntityKind::Parking, 2), Vec::new(), 1);
        assert!(!state.apply(late_parking));
        assert!(state.snapshot(EntityKind::Parking).is_none());
    }

    #[test]
    fn test_set_row_availability() {
        let mut state = ListingState::new(20);
        let params = QueryParams::new(EntityKind::Parking, 20);
        state.select(params.clone());
        state.apply(snapshot(params, vec![WireLocation::new(7, "Lot").with_available(true)], 1));

        let id = LocationId::Int(7);
        assert_eq!(state.set_row_availability(EntityKind::Parking, &id, false), Some(true));
        assert_eq!(state.row(EntityKind::Parking, &id).map(|r| r.available), Some(false));
        assert_eq!(state.set_row_availability(EntityKind::Parking, &LocationId::Int(8), true), None);
        assert_eq!(state.current_page(EntityKind::Parking), 1);
    }
}
