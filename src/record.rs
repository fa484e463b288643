//! Minimal value model for tuples crossing the scan seam. The host engine
//! owns the real tuple format; the protocol only needs typed access to the
//! leading key attributes and a notion of an empty slot.

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Int(i64),
    Text(String),
}

impl Datum {
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Datum::Int(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }
}

/// One materialised row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tuple {
    datums: Vec<Datum>,
}

impl Tuple {
    pub fn new(datums: Vec<Datum>) -> Tuple {
        Tuple { datums }
    }

    pub fn datum(&self, i: usize) -> Option<&Datum> {
        self.datums.get(i)
    }

    pub fn len(&self) -> usize {
        self.datums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datums.is_empty()
    }

    /// The composite business key: the first three attributes read as
    /// unsigned 32-bit integers. None if any of them is absent or not an
    /// integer.
    pub fn keys(&self) -> Option<(u32, u32, u32)> {
        Some((
            self.datum(0)?.as_u32()?,
            self.datum(1)?.as_u32()?,
            self.datum(2)?.as_u32()?,
        ))
    }
}

/// Borrowed view of a scan's current slot. An empty slot has no backing
/// heap row.
#[derive(Clone, Copy, Debug)]
pub struct TupleSlot<'a> {
    tuple: Option<&'a Tuple>,
}

impl<'a> TupleSlot<'a> {
    pub fn holding(tuple: &'a Tuple) -> TupleSlot<'a> {
        TupleSlot { tuple: Some(tuple) }
    }

    pub fn empty() -> TupleSlot<'static> {
        TupleSlot { tuple: None }
    }

    pub fn tuple(&self) -> Option<&'a Tuple> {
        self.tuple
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keys_from_leading_attributes() {
        let t = Tuple::new(vec![
            Datum::Int(2),
            Datum::Int(3),
            Datum::Int(7),
            Datum::Text("BARBARBAR".into()),
        ]);
        assert_eq!(t.keys(), Some((2, 3, 7)));
    }

    #[test]
    fn keys_reject_non_integers() {
        let t = Tuple::new(vec![Datum::Text("x".into()), Datum::Int(1), Datum::Int(2)]);
        assert_eq!(t.keys(), None);

        let t = Tuple::new(vec![Datum::Int(1), Datum::Int(2)]);
        assert_eq!(t.keys(), None);

        let t = Tuple::new(vec![Datum::Int(-1), Datum::Int(2), Datum::Int(3)]);
        assert_eq!(t.keys(), None);
    }

    #[test]
    fn slot_emptiness() {
        let t = Tuple::new(vec![Datum::Int(1)]);
        assert!(TupleSlot::holding(&t).tuple().is_some());
        assert!(TupleSlot::empty().tuple().is_none());
    }
}
