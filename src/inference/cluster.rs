//! Row-aligned cluster membership for cluster-robust covariances.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    selection::core::design::Table,
};
use std::{collections::HashMap, hash::Hash};

/// Cluster key per estimation row plus the names of the clustering variables.
///
/// Keys can be any hashable type; composite clusterings use tuples or
/// vectors. Rows are aligned with the estimation sample (after case
/// filtering), not with the raw table.
///
/// Invariants
/// ----------
/// - `names` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment<K> {
    names: Vec<String>,
    keys: Vec<K>,
}

impl<K: Hash + Eq + Clone> ClusterAssignment<K> {
    /// Errors
    /// ------
    /// - `EmptyClusterNames` when `names` is empty.
    pub fn new(names: Vec<String>, keys: Vec<K>) -> InferenceResult<Self> {
        if names.is_empty() {
            return Err(InferenceError::EmptyClusterNames);
        }
        Ok(Self { names, keys })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Dense group index per row (first-appearance order) and the number of
    /// distinct groups.
    pub fn group_indices(&self) -> (Vec<usize>, usize) {
        let mut seen: HashMap<&K, usize> = HashMap::new();
        let groups: Vec<usize> = self
            .keys
            .iter()
            .map(|k| {
                let next = seen.len();
                *seen.entry(k).or_insert(next)
            })
            .collect();
        (groups, seen.len())
    }
}

impl ClusterAssignment<Vec<u64>> {
    /// Composite keys from table columns at the retained estimation rows.
    ///
    /// Each key holds the bit patterns of the listed columns' values, so
    /// equal floating-point values (with `-0.0 == 0.0`) share a cluster.
    ///
    /// Parameters
    /// ----------
    /// - `table`: source table the estimation frame was built from.
    /// - `columns`: clustering variables; one or more.
    /// - `rows`: original row indices of the estimation sample.
    ///
    /// Errors
    /// ------
    /// - `EmptyClusterNames` for an empty `columns`.
    /// - `UnknownClusterColumn` for a name not in `table`.
    /// - `MissingClusterValue` for NaN on a retained row.
    pub fn from_table(table: &Table, columns: &[String], rows: &[usize]) -> InferenceResult<Self> {
        if columns.is_empty() {
            return Err(InferenceError::EmptyClusterNames);
        }
        let mut cols = Vec::with_capacity(columns.len());
        for name in columns {
            let col = table
                .column(name)
                .ok_or_else(|| InferenceError::UnknownClusterColumn { name: name.clone() })?;
            cols.push((name, col));
        }

        let mut keys = Vec::with_capacity(rows.len());
        for &row in rows {
            let mut key = Vec::with_capacity(cols.len());
            for (name, col) in &cols {
                let v = col[row];
                if v.is_nan() {
                    return Err(InferenceError::MissingClusterValue {
                        column: (*name).clone(),
                        row,
                    });
                }
                key.push(if v == 0.0 { 0u64 } else { v.to_bits() });
            }
            keys.push(key);
        }
        Self::new(columns.to_vec(), keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Groups are numbered densely in first-appearance order.
    //
    // Given
    // -----
    // - Keys "b", "a", "b", "c".
    //
    // Expect
    // ------
    // - Groups (0, 1, 0, 2) and 3 distinct groups.
    fn group_indices_are_dense() {
        let ca = ClusterAssignment::new(vec!["firm".into()], vec!["b", "a", "b", "c"])
            .expect("assignment");
        let (groups, g) = ca.group_indices();
        assert_eq!(groups, vec![0, 1, 0, 2]);
        assert_eq!(g, 3);
    }

    #[test]
    // Purpose
    // -------
    // Composite keys combine several table columns at the retained rows.
    //
    // Given
    // -----
    // - Columns firm = (1, 1, 2, 2, 1) and year = (0, −0, 0, 5, 5); retained
    //   rows {0, 1, 3, 4}.
    //
    // Expect
    // ------
    // - Rows 0 and 1 share a cluster (−0 == 0); three groups overall.
    fn from_table_builds_composite_keys() {
        let table = Table::new()
            .with_column("firm", array![1.0, 1.0, 2.0, 2.0, 1.0])
            .and_then(|t| t.with_column("year", array![0.0, -0.0, 0.0, 5.0, 5.0]))
            .expect("table");
        let cols = vec!["firm".to_string(), "year".to_string()];

        let ca = ClusterAssignment::from_table(&table, &cols, &[0, 1, 3, 4]).expect("clusters");

        let (groups, g) = ca.group_indices();
        assert_eq!(groups, vec![0, 0, 1, 2]);
        assert_eq!(g, 3);
        assert_eq!(ca.names(), cols.as_slice());
    }

    #[test]
    // Purpose
    // -------
    // Missing values and unknown columns are reported.
    //
    // Given
    // -----
    // - A cluster column with NaN at row 1; a non-existent column name.
    //
    // Expect
    // ------
    // - `MissingClusterValue { row: 1 }` and `UnknownClusterColumn`.
    fn from_table_reports_missing_and_unknown_columns() {
        let table = Table::new().with_column("g", array![1.0, f64::NAN]).expect("table");
        assert!(matches!(
            ClusterAssignment::from_table(&table, &["g".to_string()], &[0, 1]),
            Err(InferenceError::MissingClusterValue { row: 1, .. })
        ));
        assert!(matches!(
            ClusterAssignment::from_table(&table, &["h".to_string()], &[0]),
            Err(InferenceError::UnknownClusterColumn { .. })
        ));
        assert_eq!(
            ClusterAssignment::<u8>::new(vec![], vec![]),
            Err(InferenceError::EmptyClusterNames)
        );
    }
}
