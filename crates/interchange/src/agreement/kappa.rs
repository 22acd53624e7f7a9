use std::hash::Hash;

use hashbrown::HashMap;
use ndarray::{Array2, Axis};

use crate::error::{bail, InterchangeResult};

const EPSILON: f64 = 1e-10;

/// Computes Cohen's Kappa of two equally long rating sequences.
pub fn cohen<T>(a: &[T], b: &[T]) -> InterchangeResult<f64>
where
    T: Eq + Hash,
{
    if a.len() != b.len() {
        bail!(
            MismatchedAnnotationCount,
            "rating sequences differ in length ({} vs. {})",
            a.len(),
            b.len()
        );
    }

    if a.is_empty() {
        bail!(InvalidAgreementMatrix, "no ratings");
    }

    let n = a.len() as f64;
    let mut marginals: HashMap<&T, (u64, u64)> = HashMap::new();
    let mut agree = 0u64;

    for (x, y) in a.iter().zip(b.iter()) {
        marginals.entry(x).or_default().0 += 1;
        marginals.entry(y).or_default().1 += 1;
        if x == y {
            agree += 1;
        }
    }

    let po = agree as f64 / n;
    let pe: f64 = marginals
        .values()
        .map(|(x, y)| (*x as f64 / n) * (*y as f64 / n))
        .sum();

    if (1.0 - pe).abs() < EPSILON {
        bail!(
            InvalidAgreementMatrix,
            "all ratings fall into a single category"
        );
    }

    Ok((po - pe) / (1.0 - pe))
}

/// Builds the units × categories count matrix of Fleiss' Kappa.
///
/// `ratings` holds one sequence per rater; cell `[i, k]` counts the
/// raters that assigned `categories[k]` to unit `i`.
pub fn count_matrix<S: AsRef<str>>(
    categories: &[S],
    ratings: &[Vec<S>],
) -> InterchangeResult<Array2<u64>> {
    if categories.is_empty() {
        bail!(InvalidAgreementMatrix, "no categories");
    }

    let units = ratings.first().map(Vec::len).unwrap_or(0);
    if ratings.iter().any(|rater| rater.len() != units) {
        bail!(
            InvalidAgreementMatrix,
            "raters rated a different number of units"
        );
    }

    let index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(idx, category)| (category.as_ref(), idx))
        .collect();

    let mut matrix = Array2::zeros((units, categories.len()));
    for rater in ratings.iter() {
        for (unit, rating) in rater.iter().enumerate() {
            let Some(k) = index.get(rating.as_ref()) else {
                bail!(
                    InvalidAgreementMatrix,
                    "unknown category '{}'",
                    rating.as_ref()
                );
            };

            matrix[[unit, *k]] += 1;
        }
    }

    Ok(matrix)
}

/// Computes Fleiss' Kappa of a units × categories count matrix.
pub fn fleiss(matrix: &Array2<u64>) -> InterchangeResult<f64> {
    let (units, categories) = matrix.dim();
    if units == 0 || categories == 0 {
        bail!(InvalidAgreementMatrix, "empty matrix");
    }

    let row_sums = matrix.sum_axis(Axis(1));
    let n = row_sums[0];
    if row_sums.iter().any(|sum| *sum != n) {
        bail!(
            InvalidAgreementMatrix,
            "units differ in their number of ratings"
        );
    }

    if n < 2 {
        bail!(InvalidAgreementMatrix, "fewer than two raters per unit");
    }

    let m = matrix.mapv(|x| x as f64);
    let n = n as f64;
    let total = units as f64 * n;

    let p_cat = m.sum_axis(Axis(0)) / total;
    let pe: f64 = p_cat.mapv(|p| p * p).sum();

    let p_unit = (m.mapv(|x| x * x).sum_axis(Axis(1)) - n) / (n * (n - 1.0));
    let p_bar = p_unit.mean().unwrap_or(0.0);

    if (1.0 - pe).abs() < EPSILON {
        bail!(
            InvalidAgreementMatrix,
            "all ratings fall into a single category"
        );
    }

    Ok((p_bar - pe) / (1.0 - pe))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::error::InterchangeError;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn cohen_known_values() -> TestResult {
        assert_abs_diff_eq!(
            cohen(&["a", "a", "b", "b"], &["a", "b", "b", "b"])?,
            0.5,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            cohen(&["x", "y"], &["y", "x"])?,
            -1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            cohen(&["x", "y", "x"], &["x", "y", "x"])?,
            1.0,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn cohen_degenerate() {
        assert!(matches!(
            cohen(&["a", "b"], &["a"]),
            Err(InterchangeError::MismatchedAnnotationCount(_))
        ));
        assert!(matches!(
            cohen(&["a", "a"], &["a", "a"]),
            Err(InterchangeError::InvalidAgreementMatrix(_))
        ));
        assert!(matches!(
            cohen::<&str>(&[], &[]),
            Err(InterchangeError::InvalidAgreementMatrix(_))
        ));
    }

    #[test]
    fn fleiss_known_value() -> TestResult {
        let matrix = array![
            [0, 0, 0, 0, 14],
            [0, 2, 6, 4, 2],
            [0, 0, 3, 5, 6],
            [0, 3, 9, 2, 0],
            [2, 2, 8, 1, 1],
            [7, 7, 0, 0, 0],
            [3, 2, 6, 3, 0],
            [2, 5, 3, 2, 2],
            [6, 5, 2, 1, 0],
            [0, 2, 2, 3, 7],
        ];

        assert_abs_diff_eq!(fleiss(&matrix)?, 0.20993, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn fleiss_invalid() {
        let cases = [
            array![[3u64, 0], [3, 0]],
            array![[3, 0], [2, 0]],
            array![[1, 0], [0, 1]],
            Array2::zeros((0, 2)),
        ];

        for matrix in cases.iter() {
            assert!(matches!(
                fleiss(matrix),
                Err(InterchangeError::InvalidAgreementMatrix(_))
            ));
        }
    }

    #[test]
    fn count_matrix_from_ratings() -> TestResult {
        let categories = ["a", "b", "_"];
        let ratings = [vec!["a", "_"], vec!["a", "b"], vec!["b", "_"]];

        let matrix = count_matrix(&categories, &ratings)?;
        assert_eq!(matrix, array![[2u64, 1, 0], [0, 1, 2]]);

        let ratings = [vec!["a", "_"], vec!["a"]];
        assert!(count_matrix(&categories, &ratings).is_err());

        let ratings = [vec!["c"], vec!["a"]];
        assert!(count_matrix(&categories, &ratings).is_err());
        Ok(())
    }
}
