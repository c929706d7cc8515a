use std::collections::HashMap;

/// Column-major (transposed) view of a sparse row set.
///
/// Multiplying a query row against it only touches the columns the query
/// actually has, which keeps batched products proportional to the overlap
/// rather than to the base size.
pub(crate) struct ColumnMatrix<V> {
    rows: usize,
    columns: HashMap<usize, Vec<(usize, V)>>,
}

impl<V> ColumnMatrix<V> {
    /// Transpose `rows`, each given as `(column, value)` entries.
    pub(crate) fn from_rows<R, I>(rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (usize, V)>,
    {
        let mut columns: HashMap<usize, Vec<(usize, V)>> = HashMap::new();
        let mut count = 0;

        for (row, entries) in rows.into_iter().enumerate() {
            for (column, value) in entries {
                columns.entry(column).or_default().push((row, value));
            }
            count = row + 1;
        }

        Self {
            rows: count,
            columns,
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// `(row, value)` entries of one column, rows ascending.
    pub(crate) fn column(&self, column: usize) -> &[(usize, V)] {
        self.columns.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }
}
