use majorka_storage::conformance::run_conformance_suite;
use majorka_storage::MemoryStore;

#[test]
fn memory_store_passes_conformance_suite() {
    let report = run_conformance_suite(|| MemoryStore::new("conformance"));
    assert!(report.total >= 11, "{report}");
    assert_eq!(report.failed, 0, "{report}");
}
