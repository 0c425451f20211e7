use spotmap_core::models::{
    OrderClause, QueryParams, RemoteQuery, RowRange, SortDirection, SortKey, TextMatch,
};

/// Translate listing params into a fully determined remote query.
///
/// Every query is ordered by the requested key and then by identity, so two
/// rows never compare equal and adjacent pages never overlap.
pub fn build(params: &QueryParams) -> RemoteQuery {
    let needle = params.search.trim();
    let text_match = (!needle.is_empty()).then(|| TextMatch {
        needle: needle.to_string(),
        columns: params.kind.search_columns().to_vec(),
    });

    let order = vec![
        OrderClause { column: params.sort_key.column(), direction: params.direction },
        OrderClause { column: SortKey::Id.column(), direction: SortDirection::Ascending },
    ];

    RemoteQuery {
        kind: params.kind,
        collection: params.kind.collection(),
        text_match,
        order,
        range: row_range(params.page, params.page_size),
    }
}

/// Inclusive row range of a 1-based page
pub fn row_range(page: u32, page_size: u32) -> RowRange {
    let page = u64::from(page.max(1));
    let page_size = u64::from(page_size.max(1));
    RowRange { from: (page - 1) * page_size, to: page * page_size - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotmap_core::models::EntityKind;

    #[test]
    fn test_build_defaults() {
        let query = build(&QueryParams::new(EntityKind::Parking, 20));
        assert_eq!(query.collection, "parking_spots");
        assert!(query.text_match.is_none());
        assert_eq!(
            query.order,
            vec![
                OrderClause { column: "created_at", direction: SortDirection::Descending },
                OrderClause { column: "id", direction: SortDirection::Ascending },
            ]
        );
        assert_eq!(query.range, RowRange { from: 0, to: 19 });
    }

    #[test]
    fn test_build_search_and_page() {
        let params = QueryParams::new(EntityKind::Service, 10)
            .with_search("  bike shop ")
            .sorted_by(SortKey::Rating, SortDirection::Ascending)
            .at_page(3);
        let query = build(&params);

        let text_match = query.text_match.unwrap();
        assert_eq!(text_match.needle, "bike shop");
        assert_eq!(text_match.columns, EntityKind::Service.search_columns());
        assert_eq!(query.order[0].column, "rating");
        assert_eq!(query.order[1].column, "id");
        assert_eq!(query.range, RowRange { from: 20, to: 29 });
    }

    #[test]
    fn test_whitespace_search_is_no_filter() {
        let params = QueryParams::new(EntityKind::RepairStation, 20).with_search("   ");
        assert!(build(&params).text_match.is_none());
    }

    #[test]
    fn test_id_sort_keeps_tiebreak() {
        let params = QueryParams::new(EntityKind::Parking, 5)
            .sorted_by(SortKey::Id, SortDirection::Descending);
        assert_eq!(
            build(&params).order,
            vec![
                OrderClause { column: "id", direction: SortDirection::Descending },
                OrderClause { column: "id", direction: SortDirection::Ascending },
            ]
        );
    }

    #[test]
    fn test_equal_params_build_equal_queries() {
        let a = QueryParams::new(EntityKind::Parking, 20).with_search("Central");
        let b = QueryParams::new(EntityKind::Parking, 20).with_search(" Central ");
        assert_eq!(build(&a), build(&b));
    }
}
