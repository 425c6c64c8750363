//! Folds heterogeneous records into one migration plan and renders the
//! resulting rows, exercising columns, diff and tsv together.

use std::collections::BTreeMap;

use majorka_core::{
    apply, diff, row_for, tsv, Codec, Column, EntityId, Record, Schema, Value,
};

struct Hit {
    id: EntityId,
    dims: BTreeMap<String, String>,
}

impl Record for Hit {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::UInt(self.id.index)),
            "date_added" => Some(Value::Date(time::macros::date!(2019 - 02 - 18))),
            "zone" => Some(Value::text("eu")),
            _ => None,
        }
    }

    fn dimensions(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.dims)
    }
}

fn hit(index: u64, dims: &[(&str, &str)]) -> Hit {
    Hit {
        id: EntityId::new("Hits", index),
        dims: dims
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[test]
fn batch_yields_single_plan_and_aligned_rows() {
    let schema = Schema::new(vec![Column::new("zone", Codec::String)]).unwrap();
    let order = schema.ordering();
    let cmp = |a: &Column, b: &Column| order.compare(a, b);

    let records = vec![
        hit(0, &[("os", "linux"), ("region", "north")]),
        hit(1, &[("region", "south"), ("browser", "firefox")]),
    ];

    let original = schema.columns().to_vec();
    let mut acc = original.clone();
    for record in &records {
        let declared = schema.declared_columns(record);
        let patch = diff(&acc, &declared, cmp).unwrap();
        acc = apply(&acc, &patch).unwrap();
    }
    let plan = diff(&original, &acc, cmp).unwrap();
    let added: Vec<(&str, &str)> = plan
        .iter()
        .map(|step| (step.item.name.as_str(), step.after.name.as_str()))
        .collect();
    assert_eq!(
        added,
        vec![
            ("dim_browser", "zone"),
            ("dim_os", "dim_browser"),
            ("dim_region", "dim_os"),
        ]
    );

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| row_for(r, &acc).unwrap())
        .collect();
    assert_eq!(
        tsv::render(&rows).unwrap(),
        "0\t2019-02-18\teu\t\tlinux\tnorth\n1\t2019-02-18\teu\tfirefox\t\tsouth"
    );
}

#[test]
fn dimension_with_tab_is_caught_before_transmission() {
    let schema = Schema::new(Vec::new()).unwrap();
    let record = hit(3, &[("referer", "a\tb")]);
    let columns = schema.declared_columns(&record);
    let row = row_for(&record, &columns).unwrap();
    assert!(matches!(
        tsv::render(&[row]),
        Err(tsv::TsvError::TabInValue { row: 0, column: 2, .. })
    ));
}
