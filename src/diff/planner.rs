//! Change-plan scheduling.
//!
//! Produces a total order over change records such that every record's
//! prerequisites precede it. All DROPs are emitted before all non-DROPs;
//! each half is topologically sorted (Kahn) over the object dependency
//! graph plus structural edges (constraint before its table, FK after the
//! referenced table's key, index after the column it covers). Ties are
//! broken by a fixed per-kind rank and then input order, so the output is
//! deterministic for a given input.

use super::{ChangeOp, DbObject, SequenceChanges, SqlTarget};
use crate::model::{qualified_name, Database, ObjectKind, ObjectRef};
use std::collections::{BTreeMap, BinaryHeap};

/// Orders a change set for execution.
pub fn plan_changes(ops: Vec<ChangeOp>, current: &Database, desired: &Database) -> Vec<ChangeOp> {
    let ops = split_owned_sequence_creates(ops);

    let (drops, others): (Vec<ChangeOp>, Vec<ChangeOp>) = ops.into_iter().partition(is_drop);

    let mut plan = toposort(drops, current, EdgeMode::Drop);
    plan.extend(toposort(others, desired, EdgeMode::Create));
    plan
}

fn is_drop(op: &ChangeOp) -> bool {
    matches!(
        op,
        ChangeOp::Drop(_)
            | ChangeOp::DropColumn { .. }
            | ChangeOp::DropConstraint { .. }
            | ChangeOp::DropIndex { .. }
    )
}

/// A sequence created with an owner column cannot name the column before
/// the table exists; the create is split into a bare CREATE SEQUENCE plus
/// a later ALTER SEQUENCE ... OWNED BY.
fn split_owned_sequence_creates(ops: Vec<ChangeOp>) -> Vec<ChangeOp> {
    let mut out = Vec::with_capacity(ops.len());
    for op in ops {
        match op {
            ChangeOp::Create(DbObject::Sequence(mut seq)) if seq.owned_by.is_some() => {
                let owned_by = seq.owned_by.take();
                let name = seq.qualified();
                out.push(ChangeOp::Create(DbObject::Sequence(seq)));
                out.push(ChangeOp::AlterSequence {
                    name,
                    changes: SequenceChanges {
                        owned_by: Some(owned_by),
                        ..Default::default()
                    },
                });
            }
            other => out.push(other),
        }
    }
    out
}

enum EdgeMode {
    Create,
    Drop,
}

/// Execution rank inside the non-DROP half. Ranks only break toposort
/// ties; explicit edges always win.
fn create_rank(op: &ChangeOp) -> u32 {
    match op {
        ChangeOp::Create(DbObject::Schema(_)) => 0,
        ChangeOp::Rename { .. } | ChangeOp::RenameColumn { .. } => 1,
        ChangeOp::Create(DbObject::Extension(_)) => 2,
        ChangeOp::Create(DbObject::Language(_)) => 3,
        ChangeOp::Create(DbObject::Collation(_)) => 4,
        ChangeOp::Create(DbObject::Type(_)) => 5,
        ChangeOp::AddEnumValue { .. } => 6,
        ChangeOp::AlterCompositeType { .. } => 6,
        ChangeOp::Create(DbObject::Domain(_)) => 7,
        ChangeOp::AlterDomain { .. } => 8,
        ChangeOp::Create(DbObject::Sequence(_)) => 9,
        ChangeOp::Create(DbObject::Function(_)) => 10,
        ChangeOp::Create(DbObject::Aggregate(_)) => 11,
        ChangeOp::Create(DbObject::Operator(_)) => 12,
        ChangeOp::Create(DbObject::OperatorFamily(_)) => 13,
        ChangeOp::Create(DbObject::OperatorClass(_)) => 14,
        ChangeOp::Create(DbObject::Table(_)) => 15,
        ChangeOp::AddColumn { .. } => 16,
        ChangeOp::AlterColumn { .. } => 17,
        ChangeOp::AddPrimaryKey { .. } => 18,
        ChangeOp::AddUniqueConstraint { .. } => 19,
        ChangeOp::AddCheckConstraint { .. } => 20,
        ChangeOp::AddIndex { .. } => 21,
        ChangeOp::AlterTableSet { .. } => 22,
        ChangeOp::AddForeignKey { .. } => 23,
        ChangeOp::AlterSequence { .. } => 24,
        ChangeOp::ReplaceFunction(_) => 25,
        ChangeOp::Create(DbObject::View(_)) | ChangeOp::ReplaceView(_) => 26,
        ChangeOp::Create(DbObject::ForeignDataWrapper(_)) => 27,
        ChangeOp::Create(DbObject::ForeignServer(_)) => 28,
        ChangeOp::Create(DbObject::UserMapping(_)) => 29,
        ChangeOp::Create(DbObject::ForeignTable(_)) => 30,
        ChangeOp::Create(DbObject::Trigger(_)) => 31,
        ChangeOp::Create(DbObject::Rule(_)) => 32,
        ChangeOp::Create(DbObject::EventTrigger(_)) => 33,
        ChangeOp::Create(DbObject::Cast(_)) => 34,
        ChangeOp::Create(DbObject::Conversion(_)) => 35,
        ChangeOp::Create(DbObject::TsParser(_)) => 36,
        ChangeOp::Create(DbObject::TsTemplate(_)) => 37,
        ChangeOp::Create(DbObject::TsDictionary(_)) => 38,
        ChangeOp::Create(DbObject::TsConfig(_)) => 39,
        ChangeOp::RefreshMatView { .. } => 40,
        ChangeOp::AlterOwner { .. } => 41,
        ChangeOp::Revoke { .. } => 42,
        ChangeOp::Grant { .. } => 43,
        ChangeOp::Comment { .. } => 44,
        // Drops never reach this function.
        _ => 50,
    }
}

/// Execution rank inside the DROP half: reverse creation order.
fn drop_rank(op: &ChangeOp) -> u32 {
    match op {
        ChangeOp::Drop(DbObject::Trigger(_)) => 0,
        ChangeOp::Drop(DbObject::Rule(_)) => 1,
        ChangeOp::Drop(DbObject::EventTrigger(_)) => 2,
        ChangeOp::Drop(DbObject::View(_)) => 3,
        ChangeOp::DropConstraint { .. } => 4,
        ChangeOp::DropIndex { .. } => 5,
        ChangeOp::DropColumn { .. } => 6,
        ChangeOp::Drop(DbObject::ForeignTable(_)) => 7,
        ChangeOp::Drop(DbObject::UserMapping(_)) => 8,
        ChangeOp::Drop(DbObject::ForeignServer(_)) => 9,
        ChangeOp::Drop(DbObject::ForeignDataWrapper(_)) => 10,
        ChangeOp::Drop(DbObject::Table(_)) => 11,
        ChangeOp::Drop(DbObject::Cast(_)) => 12,
        ChangeOp::Drop(DbObject::Conversion(_)) => 13,
        ChangeOp::Drop(DbObject::TsConfig(_)) => 14,
        ChangeOp::Drop(DbObject::TsDictionary(_)) => 15,
        ChangeOp::Drop(DbObject::TsTemplate(_)) => 16,
        ChangeOp::Drop(DbObject::TsParser(_)) => 17,
        ChangeOp::Drop(DbObject::OperatorClass(_)) => 18,
        ChangeOp::Drop(DbObject::OperatorFamily(_)) => 19,
        ChangeOp::Drop(DbObject::Operator(_)) => 20,
        ChangeOp::Drop(DbObject::Aggregate(_)) => 21,
        ChangeOp::Drop(DbObject::Function(_)) => 22,
        ChangeOp::Drop(DbObject::Domain(_)) => 23,
        ChangeOp::Drop(DbObject::Type(_)) => 24,
        ChangeOp::Drop(DbObject::Sequence(_)) => 25,
        ChangeOp::Drop(DbObject::Collation(_)) => 26,
        ChangeOp::Drop(DbObject::Language(_)) => 27,
        ChangeOp::Drop(DbObject::Extension(_)) => 28,
        ChangeOp::Drop(DbObject::Schema(_)) => 29,
        _ => 50,
    }
}

/// Resolves the object a grant/comment/owner op anchors to, so those ops
/// can be ordered after the create of the same object.
fn target_ref(target: &SqlTarget) -> Option<ObjectRef> {
    let kind_for = |kind: ObjectKind| match kind {
        ObjectKind::MaterializedView => ObjectKind::View,
        k => k,
    };
    match target {
        SqlTarget::Schema { name } => Some(ObjectRef::new(ObjectKind::Schema, name.clone())),
        SqlTarget::Object { kind, schema, name } => Some(ObjectRef::new(
            kind_for(*kind),
            qualified_name(schema, name),
        )),
        SqlTarget::Column { schema, table, .. } => Some(ObjectRef::new(
            ObjectKind::Table,
            qualified_name(schema, table),
        )),
        SqlTarget::Routine {
            kind,
            schema,
            name,
            args,
        } => Some(ObjectRef::new(
            kind_for(*kind),
            qualified_name(schema, &format!("{name}({args})")),
        )),
        SqlTarget::Constraint { schema, table, .. } => Some(ObjectRef::new(
            ObjectKind::Table,
            qualified_name(schema, table),
        )),
        SqlTarget::OnRelation {
            kind,
            schema,
            table,
            name,
        } => Some(ObjectRef::new(
            kind_for(*kind),
            format!("{schema}.{table}.{name}"),
        )),
        SqlTarget::Global { kind, name } => Some(ObjectRef::new(kind_for(*kind), name.clone())),
        SqlTarget::Cast { source, target } => Some(ObjectRef::new(
            ObjectKind::Cast,
            format!("({source} AS {target})"),
        )),
    }
}

fn toposort(ops: Vec<ChangeOp>, model: &Database, mode: EdgeMode) -> Vec<ChangeOp> {
    let n = ops.len();
    if n <= 1 {
        return ops;
    }

    // Node lookup tables.
    let mut create_of: BTreeMap<ObjectRef, usize> = BTreeMap::new();
    let mut drop_of: BTreeMap<ObjectRef, usize> = BTreeMap::new();
    let mut add_column: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut retype_column: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut key_adds: BTreeMap<String, Vec<usize>> = BTreeMap::new();

    for (i, op) in ops.iter().enumerate() {
        match op {
            ChangeOp::Create(obj) => {
                create_of.insert(obj.object_ref(), i);
            }
            ChangeOp::Drop(obj) => {
                drop_of.insert(obj.object_ref(), i);
            }
            ChangeOp::AddColumn { table, column } => {
                add_column.insert((table.clone(), column.name.clone()), i);
            }
            ChangeOp::AlterColumn {
                table,
                column,
                changes,
            } if changes.data_type.is_some() => {
                retype_column.insert((table.clone(), column.clone()), i);
            }
            ChangeOp::AddPrimaryKey { table, .. } | ChangeOp::AddUniqueConstraint { table, .. } => {
                key_adds.entry(table.clone()).or_default().push(i);
            }
            _ => {}
        }
    }

    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut add_edge = |prereq: usize, node: usize| {
        if prereq != node {
            dependents[prereq].push(node);
            in_degree[node] += 1;
        }
    };

    let table_ref = |table: &str| ObjectRef::new(ObjectKind::Table, table.to_string());

    match mode {
        EdgeMode::Create => {
            for (i, op) in ops.iter().enumerate() {
                match op {
                    ChangeOp::Create(obj) => {
                        if let Some(deps) = model.depends_of(&obj.object_ref()) {
                            for dep in deps {
                                if let Some(&p) = create_of.get(dep) {
                                    add_edge(p, i);
                                }
                            }
                        }
                    }
                    ChangeOp::AddColumn { table, .. }
                    | ChangeOp::AlterColumn { table, .. }
                    | ChangeOp::AddPrimaryKey { table, .. }
                    | ChangeOp::AddUniqueConstraint { table, .. }
                    | ChangeOp::AddCheckConstraint { table, .. }
                    | ChangeOp::AlterTableSet { table, .. } => {
                        if let Some(&p) = create_of.get(&table_ref(table)) {
                            add_edge(p, i);
                        }
                    }
                    ChangeOp::AddIndex { table, index } => {
                        if let Some(&p) = create_of.get(&table_ref(table)) {
                            add_edge(p, i);
                        }
                        for column in &index.columns {
                            if let Some(&p) = add_column.get(&(table.clone(), column.clone())) {
                                add_edge(p, i);
                            }
                            if let Some(&p) = retype_column.get(&(table.clone(), column.clone())) {
                                add_edge(p, i);
                            }
                        }
                    }
                    ChangeOp::AddForeignKey { table, foreign_key } => {
                        if let Some(&p) = create_of.get(&table_ref(table)) {
                            add_edge(p, i);
                        }
                        for column in &foreign_key.columns {
                            if let Some(&p) = add_column.get(&(table.clone(), column.clone())) {
                                add_edge(p, i);
                            }
                        }
                        let referenced = foreign_key.referenced();
                        if let Some(&p) = create_of.get(&table_ref(&referenced)) {
                            add_edge(p, i);
                        }
                        if let Some(adds) = key_adds.get(&referenced) {
                            for &p in adds {
                                add_edge(p, i);
                            }
                        }
                    }
                    ChangeOp::AlterSequence { name, changes } => {
                        if let Some(&p) =
                            create_of.get(&ObjectRef::new(ObjectKind::Sequence, name.clone()))
                        {
                            add_edge(p, i);
                        }
                        if let Some(Some(owner)) = &changes.owned_by {
                            let table = qualified_name(&owner.table_schema, &owner.table_name);
                            if let Some(&p) = create_of.get(&table_ref(&table)) {
                                add_edge(p, i);
                            }
                        }
                    }
                    ChangeOp::RefreshMatView { name } => {
                        if let Some(&p) =
                            create_of.get(&ObjectRef::new(ObjectKind::View, name.clone()))
                        {
                            add_edge(p, i);
                        }
                    }
                    ChangeOp::AlterOwner { target, .. }
                    | ChangeOp::Comment { target, .. }
                    | ChangeOp::Grant { target, .. }
                    | ChangeOp::Revoke { target, .. } => {
                        if let Some(r) = target_ref(target) {
                            if let Some(&p) = create_of.get(&r) {
                                add_edge(p, i);
                            }
                        }
                        if let SqlTarget::Column {
                            schema,
                            table,
                            column,
                        } = target
                        {
                            let key = (qualified_name(schema, table), column.clone());
                            if let Some(&p) = add_column.get(&key) {
                                add_edge(p, i);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        EdgeMode::Drop => {
            // Dependents are dropped before the objects they require.
            for (from, deps) in &model.depends {
                if let Some(&dependent) = drop_of.get(from) {
                    for dep in deps {
                        if let Some(&dropped_later) = drop_of.get(dep) {
                            add_edge(dependent, dropped_later);
                        }
                    }
                }
            }
            for (i, op) in ops.iter().enumerate() {
                match op {
                    ChangeOp::DropConstraint { table, name } => {
                        // An FK constraint must go before the table it
                        // references can be dropped.
                        if let Some(t) = model.tables.get(table) {
                            if let Some(fk) = t.foreign_keys.iter().find(|f| &f.name == name) {
                                let referenced = fk.referenced();
                                if let Some(&later) = drop_of.get(&table_ref(&referenced)) {
                                    add_edge(i, later);
                                }
                            }
                        }
                    }
                    ChangeOp::DropColumn { table, column } => {
                        // Indexes and constraints on the column first.
                        if let Some(t) = model.tables.get(table) {
                            for index in &t.indexes {
                                if index.columns.contains(column) {
                                    // DropIndex nodes are keyed structurally.
                                    for (j, other) in ops.iter().enumerate() {
                                        if let ChangeOp::DropIndex { name, .. } = other {
                                            if name == &index.name {
                                                add_edge(j, i);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // Kahn's algorithm; the ready heap pops the lowest (rank, input order)
    // so the result is stable.
    let rank: Vec<u32> = ops
        .iter()
        .map(|op| match mode {
            EdgeMode::Create => create_rank(op),
            EdgeMode::Drop => drop_rank(op),
        })
        .collect();

    let mut heap: BinaryHeap<std::cmp::Reverse<(u32, usize)>> = BinaryHeap::new();
    for i in 0..n {
        if in_degree[i] == 0 {
            heap.push(std::cmp::Reverse((rank[i], i)));
        }
    }

    let mut order: Vec<usize> = Vec::with_capacity(n);
    while let Some(std::cmp::Reverse((_, i))) = heap.pop() {
        order.push(i);
        for &d in &dependents[i] {
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                heap.push(std::cmp::Reverse((rank[d], d)));
            }
        }
    }

    // A residual cycle (mutual FKs among drops) is broken by appending the
    // remaining nodes in rank order.
    if order.len() < n {
        let mut rest: Vec<usize> = (0..n).filter(|i| !order.contains(i)).collect();
        rest.sort_by_key(|&i| (rank[i], i));
        order.extend(rest);
    }

    let mut slots: Vec<Option<ChangeOp>> = ops.into_iter().map(Some).collect();
    order
        .into_iter()
        .map(|i| slots[i].take().expect("each op scheduled once"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeOp, ColumnChanges, DbObject};
    use crate::model::{
        Column, ForeignKey, Index, PrimaryKey, ReferentialAction, Schema, Sequence, SequenceOwner,
        Table,
    };

    fn table(schema: &str, name: &str) -> Table {
        Table {
            schema: schema.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn position(plan: &[ChangeOp], predicate: impl Fn(&ChangeOp) -> bool) -> usize {
        plan.iter().position(predicate).expect("op present in plan")
    }

    #[test]
    fn drops_precede_non_drops() {
        let empty = Database::new();
        let ops = vec![
            ChangeOp::Create(DbObject::Table(table("public", "t_new"))),
            ChangeOp::Drop(DbObject::Table(table("public", "t_old"))),
        ];
        let plan = plan_changes(ops, &empty, &empty);
        assert!(matches!(&plan[0], ChangeOp::Drop(_)));
        assert!(matches!(&plan[1], ChangeOp::Create(_)));
    }

    #[test]
    fn index_recreate_brackets_the_type_change() {
        let empty = Database::new();
        let ops = vec![
            ChangeOp::AddIndex {
                table: "public.t".into(),
                index: Index {
                    name: "ix".into(),
                    columns: vec!["c".into()],
                    ..Default::default()
                },
            },
            ChangeOp::AlterColumn {
                table: "public.t".into(),
                column: "c".into(),
                changes: ColumnChanges {
                    data_type: Some("text".into()),
                    ..Default::default()
                },
            },
            ChangeOp::DropIndex {
                schema: "public".into(),
                name: "ix".into(),
            },
        ];
        let plan = plan_changes(ops, &empty, &empty);

        let drop_ix = position(&plan, |op| matches!(op, ChangeOp::DropIndex { .. }));
        let alter = position(&plan, |op| matches!(op, ChangeOp::AlterColumn { .. }));
        let add_ix = position(&plan, |op| matches!(op, ChangeOp::AddIndex { .. }));
        assert!(drop_ix < alter, "DROP INDEX before ALTER COLUMN");
        assert!(alter < add_ix, "CREATE INDEX after ALTER COLUMN");
    }

    #[test]
    fn fk_comes_after_referenced_table_and_its_key() {
        let empty = Database::new();
        let fk = ForeignKey {
            name: "t1_c2_fkey".into(),
            columns: vec!["c2".into()],
            ref_schema: "s1".into(),
            ref_table: "t2".into(),
            ref_columns: vec!["c21".into()],
            on_update: ReferentialAction::NoAction,
            on_delete: ReferentialAction::NoAction,
            deferrable: false,
            initially_deferred: false,
            description: None,
        };
        let ops = vec![
            ChangeOp::AddForeignKey {
                table: "public.t1".into(),
                foreign_key: fk,
            },
            ChangeOp::AddPrimaryKey {
                table: "s1.t2".into(),
                primary_key: PrimaryKey {
                    name: "t2_pkey".into(),
                    columns: vec!["c21".into()],
                    description: None,
                },
            },
            ChangeOp::Create(DbObject::Table(table("s1", "t2"))),
            ChangeOp::Create(DbObject::Table(table("public", "t1"))),
            ChangeOp::Create(DbObject::Schema(Schema {
                name: "s1".into(),
                ..Default::default()
            })),
        ];
        let plan = plan_changes(ops, &empty, &empty);

        let schema_pos = position(&plan, |op| {
            matches!(op, ChangeOp::Create(DbObject::Schema(_)))
        });
        let t2_pos = position(&plan, |op| {
            matches!(op, ChangeOp::Create(DbObject::Table(t)) if t.name == "t2")
        });
        let pk_pos = position(&plan, |op| matches!(op, ChangeOp::AddPrimaryKey { .. }));
        let fk_pos = position(&plan, |op| matches!(op, ChangeOp::AddForeignKey { .. }));
        assert!(schema_pos < t2_pos);
        assert!(t2_pos < pk_pos);
        assert!(pk_pos < fk_pos, "FK never precedes the referenced key");
    }

    #[test]
    fn owned_sequence_create_is_split_around_the_table() {
        let empty = Database::new();
        let seq = Sequence {
            schema: "public".into(),
            name: "t_c1_seq".into(),
            owned_by: Some(SequenceOwner {
                table_schema: "public".into(),
                table_name: "t".into(),
                column_name: "c1".into(),
            }),
            ..Default::default()
        };
        let ops = vec![
            ChangeOp::Create(DbObject::Sequence(seq)),
            ChangeOp::Create(DbObject::Table(table("public", "t"))),
        ];
        let plan = plan_changes(ops, &empty, &empty);

        let create_seq = position(&plan, |op| {
            matches!(op, ChangeOp::Create(DbObject::Sequence(s)) if s.owned_by.is_none())
        });
        let create_table = position(&plan, |op| {
            matches!(op, ChangeOp::Create(DbObject::Table(_)))
        });
        let set_owner = position(&plan, |op| {
            matches!(op, ChangeOp::AlterSequence { changes, .. } if changes.owned_by.is_some())
        });
        assert!(create_seq < create_table);
        assert!(create_table < set_owner);
    }

    #[test]
    fn dependent_drop_goes_first() {
        // current model: t1 requires t2, so t1 drops first.
        let mut current = Database::new();
        current.tables.insert("public.t1".into(), table("public", "t1"));
        current.tables.insert("public.t2".into(), table("public", "t2"));
        current.add_edge(
            ObjectRef::new(ObjectKind::Table, "public.t1"),
            ObjectRef::new(ObjectKind::Table, "public.t2"),
        );

        let ops = vec![
            ChangeOp::Drop(DbObject::Table(table("public", "t2"))),
            ChangeOp::Drop(DbObject::Table(table("public", "t1"))),
        ];
        let plan = plan_changes(ops, &current, &Database::new());
        assert!(matches!(&plan[0], ChangeOp::Drop(DbObject::Table(t)) if t.name == "t1"));
        assert!(matches!(&plan[1], ChangeOp::Drop(DbObject::Table(t)) if t.name == "t2"));
    }

    #[test]
    fn child_ops_wait_for_their_table_create() {
        let mut desired = Database::new();
        desired.tables.insert("public.t".into(), table("public", "t"));
        let columns_ops = vec![
            ChangeOp::AddColumn {
                table: "public.t".into(),
                column: Column::new("c", "integer"),
            },
            ChangeOp::Create(DbObject::Table(table("public", "t"))),
        ];
        let plan = plan_changes(columns_ops, &Database::new(), &desired);
        let create = position(&plan, |op| matches!(op, ChangeOp::Create(_)));
        let add = position(&plan, |op| matches!(op, ChangeOp::AddColumn { .. }));
        assert!(create < add, "ADD COLUMN waits for CREATE TABLE");
    }

    #[test]
    fn planning_is_deterministic() {
        let empty = Database::new();
        let make_ops = || {
            vec![
                ChangeOp::Create(DbObject::Table(table("public", "b"))),
                ChangeOp::Create(DbObject::Table(table("public", "a"))),
                ChangeOp::Drop(DbObject::Table(table("public", "z"))),
                ChangeOp::Create(DbObject::Schema(Schema {
                    name: "s1".into(),
                    ..Default::default()
                })),
            ]
        };
        let plan1 = plan_changes(make_ops(), &empty, &empty);
        let plan2 = plan_changes(make_ops(), &empty, &empty);
        assert_eq!(plan1, plan2);
        // drops first, then schema, then tables in input order
        assert!(matches!(&plan1[0], ChangeOp::Drop(_)));
        assert!(matches!(&plan1[1], ChangeOp::Create(DbObject::Schema(_))));
    }
}
