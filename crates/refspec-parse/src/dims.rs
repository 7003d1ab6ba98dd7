//! Cartesian-product expansion of generator dimensions.
//!
//! The first-declared dimension is the outermost (slowest-varying) loop and
//! the last-declared the innermost, like an odometer. The product is lazy and
//! restartable: [`DimensionProduct::iter`] can be called any number of times,
//! and nothing beyond one index per axis is materialized.

use refspec_types::{Dimension, OrderedMap, Range};

use crate::error::GeneratorError;

/// Largest coordinate magnitude. Coordinates become `f64` in the render
/// context, which holds integers exactly only up to 2^53.
pub const MAX_COORDINATE: i64 = 1 << 53;

/// One axis of the product: explicit values or a validated range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Values(Vec<i64>),
    Stepped { start: i64, step: i64, len: u64 },
}

impl Axis {
    /// Validate `dimension` and turn it into an axis.
    ///
    /// Ranges are half-open. A zero step, or a step whose sign cannot reach
    /// `stop` from `start`, fails instead of iterating forever. Every value
    /// must lie within `±MAX_COORDINATE`.
    pub fn new(name: &str, dimension: &Dimension) -> Result<Self, GeneratorError> {
        let axis = match dimension {
            Dimension::Values(values) => Axis::Values(values.clone()),
            Dimension::Range(range) => Self::from_range(name, range)?,
        };
        axis.check_bounds(name)?;
        Ok(axis)
    }

    fn check_bounds(&self, name: &str) -> Result<(), GeneratorError> {
        let out_of_range = |value: i64| GeneratorError::OutOfRange {
            dimension: name.to_string(),
            value,
        };
        match self {
            Axis::Values(values) => match values.iter().find(|v| v.unsigned_abs() > MAX_COORDINATE as u64) {
                Some(&v) => Err(out_of_range(v)),
                None => Ok(()),
            },
            // Monotonic, so the endpoints bound every value.
            Axis::Stepped { start, len, .. } if *len > 0 => {
                for v in [*start, self.value(len - 1)] {
                    if v.unsigned_abs() > MAX_COORDINATE as u64 {
                        return Err(out_of_range(v));
                    }
                }
                Ok(())
            }
            Axis::Stepped { .. } => Ok(()),
        }
    }

    fn from_range(name: &str, range: &Range) -> Result<Self, GeneratorError> {
        let Range { start, stop, step } = *range;
        if step == 0 {
            return Err(GeneratorError::ZeroStep {
                dimension: name.to_string(),
            });
        }
        let span = stop as i128 - start as i128;
        if span != 0 && (span > 0) != (step > 0) {
            return Err(GeneratorError::Unreachable {
                dimension: name.to_string(),
                start,
                stop,
                step,
            });
        }
        let step_wide = step as i128;
        let len = if span == 0 {
            0
        } else if step > 0 {
            (span + step_wide - 1) / step_wide
        } else {
            (span + step_wide + 1) / step_wide
        };
        Ok(Axis::Stepped {
            start,
            step,
            len: len as u64,
        })
    }

    pub fn len(&self) -> u64 {
        match self {
            Axis::Values(values) => values.len() as u64,
            Axis::Stepped { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at position `index`; `index` must be below [`len`](Self::len).
    pub fn value(&self, index: u64) -> i64 {
        match self {
            Axis::Values(values) => values[index as usize],
            Axis::Stepped { start, step, .. } => {
                (*start as i128 + index as i128 * *step as i128) as i64
            }
        }
    }
}

/// Validated set of named axes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionProduct {
    names: Vec<String>,
    axes: Vec<Axis>,
}

impl DimensionProduct {
    pub fn new(dimensions: &OrderedMap<Dimension>) -> Result<Self, GeneratorError> {
        let mut names = Vec::with_capacity(dimensions.len());
        let mut axes = Vec::with_capacity(dimensions.len());
        for (name, dimension) in dimensions.iter() {
            axes.push(Axis::new(name, dimension)?);
            names.push(name.to_string());
        }
        Ok(Self { names, axes })
    }

    /// Dimension names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Number of coordinate tuples (saturating). Zero if there are no axes
    /// or any axis is empty.
    pub fn len(&self) -> u64 {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes
            .iter()
            .fold(1u64, |acc, axis| acc.saturating_mul(axis.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() || self.axes.iter().any(Axis::is_empty)
    }

    /// Iterate the product from the beginning.
    pub fn iter(&self) -> Coordinates<'_> {
        Coordinates {
            product: self,
            indices: vec![0; self.axes.len()],
            done: self.is_empty(),
        }
    }
}

impl<'a> IntoIterator for &'a DimensionProduct {
    type Item = Coordinate<'a>;
    type IntoIter = Coordinates<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One point of the product: a value per dimension, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coordinate<'a> {
    names: &'a [String],
    values: Vec<i64>,
}

impl<'a> Coordinate<'a> {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, i64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Odometer over a [`DimensionProduct`].
#[derive(Clone, Debug)]
pub struct Coordinates<'a> {
    product: &'a DimensionProduct,
    indices: Vec<u64>,
    done: bool,
}

impl<'a> Iterator for Coordinates<'a> {
    type Item = Coordinate<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let axes = &self.product.axes;
        let values = axes
            .iter()
            .zip(&self.indices)
            .map(|(axis, &i)| axis.value(i))
            .collect();

        // Advance the innermost axis, carrying outward.
        let mut k = axes.len();
        loop {
            if k == 0 {
                self.done = true;
                break;
            }
            k -= 1;
            self.indices[k] += 1;
            if self.indices[k] < axes[k].len() {
                break;
            }
            self.indices[k] = 0;
        }

        Some(Coordinate {
            names: &self.product.names,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(entries: Vec<(&str, Dimension)>) -> OrderedMap<Dimension> {
        entries.into_iter().collect()
    }

    fn range(start: i64, stop: i64, step: i64) -> Dimension {
        Dimension::Range(Range { start, stop, step })
    }

    fn tuples(product: &DimensionProduct) -> Vec<Vec<i64>> {
        product.iter().map(|c| c.values().to_vec()).collect()
    }

    #[test]
    fn single_range() {
        let p = DimensionProduct::new(&dims(vec![("i", Dimension::Range(Range::to(5)))])).unwrap();
        assert_eq!(tuples(&p), vec![vec![0], vec![1], vec![2], vec![3], vec![4]]);
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn first_declared_is_outermost() {
        let p = DimensionProduct::new(&dims(vec![
            ("a", Dimension::Values(vec![1, 2])),
            ("b", range(0, 3, 1)),
        ]))
        .unwrap();
        assert_eq!(
            tuples(&p),
            vec![
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1],
                vec![2, 2],
            ]
        );
        let first = p.iter().next().unwrap();
        assert_eq!(first.iter().collect::<Vec<_>>(), vec![("a", 1), ("b", 0)]);
        assert_eq!(first.get("b"), Some(0));
        assert_eq!(first.get("c"), None);
    }

    #[test]
    fn restartable() {
        let p = DimensionProduct::new(&dims(vec![("i", range(5, 7, 1))])).unwrap();
        assert_eq!(tuples(&p), tuples(&p));
        assert_eq!(tuples(&p), vec![vec![5], vec![6]]);
    }

    #[test]
    fn stepped_and_descending_ranges() {
        let p = DimensionProduct::new(&dims(vec![("i", range(0, 5, 2))])).unwrap();
        assert_eq!(tuples(&p), vec![vec![0], vec![2], vec![4]]);
        let p = DimensionProduct::new(&dims(vec![("i", range(5, 0, -2))])).unwrap();
        assert_eq!(tuples(&p), vec![vec![5], vec![3], vec![1]]);
    }

    #[test]
    fn no_dimensions_is_empty() {
        let p = DimensionProduct::new(&OrderedMap::new()).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.len(), 0);
        assert_eq!(p.iter().count(), 0);
    }

    #[test]
    fn empty_axis_empties_product() {
        let p = DimensionProduct::new(&dims(vec![
            ("a", Dimension::Values(vec![1, 2, 3])),
            ("b", Dimension::Values(vec![])),
        ]))
        .unwrap();
        assert_eq!(p.iter().count(), 0);

        let p = DimensionProduct::new(&dims(vec![("a", range(3, 3, 1))])).unwrap();
        assert_eq!(p.iter().count(), 0);
    }

    #[test]
    fn zero_step_fails() {
        let err = DimensionProduct::new(&dims(vec![("i", range(0, 5, 0))])).unwrap_err();
        assert_eq!(err, GeneratorError::ZeroStep { dimension: "i".into() });
    }

    #[test]
    fn wrong_sign_step_fails() {
        let err = DimensionProduct::new(&dims(vec![("i", range(0, 5, -1))])).unwrap_err();
        assert!(matches!(err, GeneratorError::Unreachable { .. }));
        let err = DimensionProduct::new(&dims(vec![("j", range(5, 0, 1))])).unwrap_err();
        assert!(matches!(err, GeneratorError::Unreachable { ref dimension, .. } if dimension == "j"));
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let err = Axis::new("i", &range(i64::MIN, i64::MAX, i64::MAX)).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::OutOfRange {
                dimension: "i".into(),
                value: i64::MIN
            }
        );
    }

    #[test]
    fn coordinates_limited_to_exact_integers() {
        let axis = Axis::new("i", &range(-MAX_COORDINATE, MAX_COORDINATE + 1, MAX_COORDINATE)).unwrap();
        assert_eq!(axis.len(), 3);
        assert_eq!(axis.value(2), MAX_COORDINATE);

        let err = Axis::new("i", &range(MAX_COORDINATE - 1, MAX_COORDINATE + 2, 1)).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::OutOfRange {
                dimension: "i".into(),
                value: MAX_COORDINATE + 1
            }
        );

        let err = Axis::new("v", &Dimension::Values(vec![1, -(MAX_COORDINATE + 1)])).unwrap_err();
        assert!(matches!(err, GeneratorError::OutOfRange { value, .. } if value == -(MAX_COORDINATE + 1)));
    }

    proptest! {
        #[test]
        fn product_size_is_product_of_axis_sizes(sizes in proptest::collection::vec(0usize..5, 1..4)) {
            let entries: Vec<(String, Dimension)> = sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| (format!("d{i}"), Dimension::Values((0..n as i64).collect())))
                .collect();
            let map: OrderedMap<Dimension> = entries.into_iter().collect();
            let p = DimensionProduct::new(&map).unwrap();
            let expected: usize = sizes.iter().product();
            prop_assert_eq!(p.iter().count(), expected);
            prop_assert_eq!(p.len(), expected as u64);
        }
    }
}
