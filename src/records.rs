//! Page-local record lists
//!
//! Each page owns the list it fetched. A successful create appends the new
//! record, a successful delete removes it, and failures leave the list as it
//! was. Nothing is shared between pages.

use crate::model::{
    Building, Gateway, Goal, Invoice, MaintenanceTask, ManualEntry, Meter, Record, RecordId, Site,
};
use crate::upstream::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordList<T: Record> {
    items: Vec<T>,
}

impl<T: Record> RecordList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append the created record; on failure return the operator message
    pub fn apply_created(&mut self, result: Result<T, ApiError>) -> Result<&T, String> {
        match result {
            Ok(record) => {
                self.items.push(record);
                Ok(&self.items[self.items.len() - 1])
            }
            Err(e) => Err(e.user_message()),
        }
    }

    /// Remove every record with `id`; returns how many were removed
    pub fn apply_deleted(&mut self, id: &RecordId, result: Result<(), ApiError>) -> Result<usize, String> {
        match result {
            Ok(()) => {
                let before = self.items.len();
                self.items.retain(|item| item.id() != id);
                Ok(before - self.items.len())
            }
            Err(e) => Err(e.user_message()),
        }
    }
}

impl<T: Record> From<Vec<T>> for RecordList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Text a record can be found by
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    /// Primary display name, used for sorting
    fn display_name(&self) -> &str;
}

fn fields<'a>(base: &[&'a str], optional: &[&'a Option<String>]) -> Vec<&'a str> {
    base.iter()
        .copied()
        .chain(optional.iter().filter_map(|o| o.as_deref()))
        .collect()
}

impl Searchable for Site {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.name.as_str(), self.id.as_str()], &[&self.address, &self.city])
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Searchable for Building {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.name.as_str(), self.id.as_str()], &[&self.address])
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Searchable for Meter {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.id.as_str()], &[&self.serial, &self.medium, &self.status])
    }

    fn display_name(&self) -> &str {
        self.serial.as_deref().unwrap_or(self.id.as_str())
    }
}

impl Searchable for Gateway {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.name.as_str(), self.id.as_str()], &[&self.host])
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Searchable for MaintenanceTask {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.title.as_str()], &[&self.description, &self.assignee, &self.status])
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

impl Searchable for Invoice {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.id.as_str()], &[&self.number, &self.customer, &self.period])
    }

    fn display_name(&self) -> &str {
        self.number.as_deref().unwrap_or(self.id.as_str())
    }
}

impl Searchable for Goal {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.title.as_str()], &[&self.metric])
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

impl Searchable for ManualEntry {
    fn search_fields(&self) -> Vec<&str> {
        fields(&[self.meter_id.as_str()], &[&self.note])
    }

    fn display_name(&self) -> &str {
        self.meter_id.as_str()
    }
}

/// Records whose search fields contain `query`, case-insensitively.
///
/// A blank query returns the whole dataset in its original order.
pub fn filter_records<T: Searchable + Clone>(records: &[T], query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| {
            record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// As delivered by the API
    #[default]
    Natural,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("name") | Some("name_asc") => SortOrder::NameAsc,
            Some("-name") | Some("name_desc") => SortOrder::NameDesc,
            _ => SortOrder::Natural,
        }
    }
}

pub fn sort_records<T: Searchable>(records: &mut [T], order: SortOrder) {
    let key = |r: &T| r.display_name().to_lowercase();
    match order {
        SortOrder::Natural => {}
        SortOrder::NameAsc => records.sort_by_key(key),
        SortOrder::NameDesc => records.sort_by(|a, b| key(b).cmp(&key(a))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    fn failed() -> ApiError {
        ApiError::Status {
            status: 422,
            message: Some("Title already taken".into()),
        }
    }

    #[test]
    fn create_appends_exactly_one() {
        let mut list = RecordList::new(demo::goals());
        let before = list.len();
        let goal = Goal {
            id: RecordId::from("g-new"),
            title: "New goal".into(),
            ..Default::default()
        };
        let created = list.apply_created(Ok(goal.clone())).unwrap().clone();
        assert_eq!(created, goal);
        assert_eq!(list.len(), before + 1);
        assert_eq!(list.items().last(), Some(&goal));
    }

    #[test]
    fn failed_create_leaves_list_unchanged() {
        let mut list = RecordList::new(demo::goals());
        let snapshot = list.clone();
        let err = list.apply_created(Err(failed())).unwrap_err();
        assert_eq!(err, "Title already taken");
        assert_eq!(list, snapshot);
    }

    #[test]
    fn delete_removes_only_target() {
        let mut list = RecordList::new(demo::gateways());
        let removed = list
            .apply_deleted(&RecordId::from("gw-2"), Ok(()))
            .unwrap();
        assert_eq!(removed, 1);
        let ids: Vec<_> = list.items().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["gw-1", "gw-3"]);
    }

    #[test]
    fn failed_delete_keeps_record() {
        let mut list = RecordList::new(demo::gateways());
        assert!(list
            .apply_deleted(&RecordId::from("gw-2"), Err(failed()))
            .is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn delete_of_unknown_id_is_noop() {
        let mut list = RecordList::new(demo::gateways());
        assert_eq!(list.apply_deleted(&RecordId::from("nope"), Ok(())), Ok(0));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn blank_query_returns_dataset_unchanged() {
        let sites = demo::sites();
        assert_eq!(filter_records(&sites, ""), sites);
        assert_eq!(filter_records(&sites, "   "), sites);
    }

    #[test]
    fn filter_is_case_insensitive_and_pure() {
        let sites = demo::sites();
        let copy = sites.clone();
        let hits = filter_records(&sites, "BREMEN");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Lindenhof Estate");
        assert_eq!(sites, copy);
        assert_eq!(filter_records(&sites, "bremen"), filter_records(&sites, "bremen"));
        assert!(filter_records(&sites, "zzz").is_empty());
    }

    #[test]
    fn meters_found_by_serial() {
        let hits = filter_records(&demo::meters(), "7155");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn sort_by_name() {
        let mut sites = demo::sites();
        sort_records(&mut sites, SortOrder::NameAsc);
        assert_eq!(sites[0].name, "Am Wasserturm");
        sort_records(&mut sites, SortOrder::NameDesc);
        assert_eq!(sites[0].name, "Nordhafen Quarter");
        assert_eq!(SortOrder::parse(Some("-name")), SortOrder::NameDesc);
        assert_eq!(SortOrder::parse(None), SortOrder::Natural);
    }
}
