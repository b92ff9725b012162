//! Property tests: no scan strategy misses a matching page, and the page
//! signature and bit-slice scans return the same pages.

use proptest::prelude::*;
use sigfile::signature::{psig, Bits};
use sigfile::{PageId, Query, Relation, RelationConfig, ScanStrategy, Tuple, WILDCARD};
use tempfile::TempDir;

const NATTRS: usize = 3;

fn config() -> RelationConfig {
    // 49-byte slots: 83 tuples per data page
    RelationConfig::new(NATTRS as u32, 0.05, 2, 32, 64, 64)
}

fn value() -> impl Strategy<Value = String> {
    // small alphabet so queries hit stored values often
    "[a-d]{1,3}"
}

fn tuples() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(value(), NATTRS), 1..120)
}

fn mask() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), NATTRS)
}

/// Build a query from `source`, replacing the attributes `mask` marks with
/// the wildcard.
fn query_from(source: &[String], mask: &[bool]) -> Tuple {
    let values: Vec<&str> = source
        .iter()
        .zip(mask)
        .map(|(v, &wild)| if wild { WILDCARD } else { v.as_str() })
        .collect();
    Tuple::from_values(values.as_slice())
}

fn load(dir: &TempDir, rows: &[Vec<String>]) -> Relation {
    let mut relation = Relation::create(dir.path().join("r"), config()).unwrap();
    for row in rows {
        relation.insert(&Tuple::from_values(row.as_slice())).unwrap();
    }
    relation
}

fn matches(row: &[String], query: &Tuple) -> bool {
    row.iter()
        .zip(query.values())
        .all(|(v, q)| q == WILDCARD || v == q)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_no_false_negatives(rows in tuples(), pick in any::<prop::sample::Index>(), mask in mask()) {
        let dir = TempDir::new().unwrap();
        let relation = load(&dir, &rows);
        let per_page = relation.stats().tuples_per_page as usize;

        let query_tuple = query_from(&rows[pick.index(rows.len())], &mask);
        for strategy in ScanStrategy::ALL {
            let mut query = Query::new(&relation, query_tuple.clone());
            query.evaluate(strategy).unwrap();
            for (i, row) in rows.iter().enumerate() {
                if matches(row, &query_tuple) {
                    prop_assert!(
                        query.pages().is_set(i / per_page),
                        "{} missed page {} for {}",
                        strategy,
                        i / per_page,
                        query_tuple
                    );
                }
            }
        }

        relation.close().unwrap();
    }

    #[test]
    fn test_page_and_slice_scans_agree(rows in tuples(), pick in any::<prop::sample::Index>(), mask in mask()) {
        let dir = TempDir::new().unwrap();
        let relation = load(&dir, &rows);

        let query_tuple = query_from(&rows[pick.index(rows.len())], &mask);
        let mut by_page = Query::new(&relation, query_tuple.clone());
        by_page.evaluate(ScanStrategy::PageSignatures).unwrap();
        let mut by_slice = Query::new(&relation, query_tuple);
        by_slice.evaluate(ScanStrategy::BitSlices).unwrap();

        prop_assert_eq!(by_page.candidate_pages(), by_slice.candidate_pages());

        relation.close().unwrap();
    }

    #[test]
    fn test_candidates_stay_within_relation(rows in tuples(), pick in any::<prop::sample::Index>(), mask in mask()) {
        let dir = TempDir::new().unwrap();
        let relation = load(&dir, &rows);
        let npages = relation.npages();

        let query_tuple = query_from(&rows[pick.index(rows.len())], &mask);
        for strategy in ScanStrategy::ALL {
            let mut query = Query::new(&relation, query_tuple.clone());
            query.evaluate(strategy).unwrap();
            prop_assert!(query.candidate_pages().iter().all(|p| p.0 < npages));

            let mut all = Query::new(&relation, Tuple::wildcard(NATTRS));
            all.evaluate(strategy).unwrap();
            prop_assert_eq!(all.candidate_pages().len() as u32, npages);
        }

        relation.close().unwrap();
    }

    #[test]
    fn test_page_signature_is_or_of_tuples(rows in tuples()) {
        let dir = TempDir::new().unwrap();
        let relation = load(&dir, &rows);
        let stats = relation.stats();
        let per_page = stats.tuples_per_page as usize;

        for (page, chunk) in rows.chunks(per_page).enumerate() {
            let mut expected = Bits::new(stats.psig_bits as usize);
            for row in chunk {
                let tuple = Tuple::from_values(row.as_slice());
                expected.or_assign(&psig::make_page_signature(&stats, &tuple));
            }
            let stored = relation.page_signature(PageId::new(page as u32)).unwrap();
            prop_assert_eq!(stored, expected);
        }

        relation.close().unwrap();
    }
}
