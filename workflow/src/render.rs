use ndarray::Array2;

/// Renders a boolean slice as text, one row per line: `#` for positive
/// voxels, `.` for background.
pub fn render_slice(slice: &Array2<bool>) -> String {
    let (rows, cols) = slice.dim();
    let mut out = String::with_capacity(rows * (cols + 1));

    for i in 0..rows {
        for j in 0..cols {
            out.push(if slice[(i, j)] { '#' } else { '.' });
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rows_and_columns() {
        let slice =
            Array2::from_shape_vec((2, 3), vec![true, false, false, false, true, true]).unwrap();
        assert_eq!(render_slice(&slice), "#..\n.##\n");
    }
}
