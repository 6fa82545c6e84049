use csv_partitioner::testing::numbered_table;
use csv_partitioner::{partition_count, split};
use std::num::NonZeroUsize;

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn balanced_split_of_250_by_100() {
    let table = numbered_table(250, &["id", "v"]);
    let parts = split(&table, nz(100));
    let sizes: Vec<usize> = parts.iter().map(|p| p.len()).collect();
    assert_eq!(sizes, vec![84, 83, 83]);
    assert_eq!(parts[1].rows[0][0], "id-84");
}

#[test]
fn rows_are_conserved_in_order() {
    for rows in [0, 1, 7, 99, 100, 101, 250, 1001] {
        let table = numbered_table(rows, &["id"]);
        for max in [1, 3, 10, 100, 2000] {
            let parts = split(&table, nz(max));
            let rejoined: Vec<_> = parts.iter().flat_map(|p| p.rows.iter().cloned()).collect();
            assert_eq!(rejoined, table.rows(), "rows={rows} max={max}");
            assert!(parts.iter().all(|p| p.columns == table.columns()));
        }
    }
}

#[test]
fn partition_count_and_balance_hold() {
    for rows in [0, 1, 5, 10, 11, 64, 333] {
        let table = numbered_table(rows, &["a", "b"]);
        for max in [1, 2, 4, 10, 64, 500] {
            let parts = split(&table, nz(max));
            assert_eq!(parts.len(), rows.div_ceil(max).max(1));
            assert_eq!(parts.len(), partition_count(rows, nz(max)));

            let largest = parts.iter().map(|p| p.len()).max().unwrap();
            let smallest = parts.iter().map(|p| p.len()).min().unwrap();
            assert!(largest - smallest <= 1, "rows={rows} max={max}");
            assert!(largest <= max);
        }
    }
}

#[test]
fn leading_partitions_take_the_remainder() {
    let table = numbered_table(10, &["id"]);
    let sizes: Vec<usize> = split(&table, nz(3)).iter().map(|p| p.len()).collect();
    assert_eq!(sizes, vec![3, 3, 2, 2]);
}

#[test]
fn limit_above_row_count_gives_one_partition() {
    let table = numbered_table(42, &["id"]);
    let parts = split(&table, nz(42));
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].len(), 42);
    assert_eq!(split(&table, nz(1_000)).len(), 1);
}

#[test]
fn empty_table_yields_one_empty_partition() {
    let table = numbered_table(0, &["id", "name"]);
    let parts = split(&table, nz(100));
    assert_eq!(parts.len(), 1);
    assert!(parts[0].is_empty());
    assert_eq!(parts[0].columns, ["id", "name"]);
    assert_eq!(parts[0].index, 0);
}
