//! The fixed-size transfer record between application threads and the
//! assembly worker.

use crate::attrs::{Attribute, MAX_ATTRIBUTES_PER_TRACELET};
use crate::Id;

pub const CACHE_LINE_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    SpanStart,
    SpanEnd,
    Event,
}

/// One ring slot's worth of trace data. Plain `Copy` value, aligned to a
/// cache line so neighbouring slots never share one, sized to a multiple of
/// the line so the slot array stays aligned throughout.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(64))]
pub struct Tracelet {
    pub timestamp: u64,
    pub trace_id: Id,
    pub span_id: Id,
    pub parent_span_id: Id,
    pub cause_id: Id,
    pub name_hash: u64,
    pub record_type: RecordType,
    pub num_attributes: u8,
    pub attributes: [Attribute; MAX_ATTRIBUTES_PER_TRACELET],
}

const _: () = {
    assert!(std::mem::size_of::<Tracelet>() % CACHE_LINE_SIZE == 0);
    assert!(std::mem::align_of::<Tracelet>() == CACHE_LINE_SIZE);
};

impl Tracelet {
    /// Constructor for span-start and event records. Slots past
    /// `num_attributes` are filled with the empty sentinel so stale producer
    /// bytes never cross the ring.
    #[allow(clippy::too_many_arguments)]
    pub fn with_attributes(
        timestamp: u64,
        trace_id: Id,
        span_id: Id,
        parent_span_id: Id,
        cause_id: Id,
        name_hash: u64,
        record_type: RecordType,
        attrs: &[Attribute; MAX_ATTRIBUTES_PER_TRACELET],
        num_attributes: u8,
    ) -> Self {
        let count = (num_attributes as usize).min(MAX_ATTRIBUTES_PER_TRACELET);
        let mut attributes = [Attribute::EMPTY; MAX_ATTRIBUTES_PER_TRACELET];
        attributes[..count].copy_from_slice(&attrs[..count]);
        Self {
            timestamp,
            trace_id,
            span_id,
            parent_span_id,
            cause_id,
            name_hash,
            record_type,
            num_attributes: count as u8,
            attributes,
        }
    }

    /// Constructor for span-end records, which carry no attributes.
    pub fn without_attributes(
        timestamp: u64,
        trace_id: Id,
        span_id: Id,
        parent_span_id: Id,
        cause_id: Id,
        name_hash: u64,
        record_type: RecordType,
    ) -> Self {
        Self {
            timestamp,
            trace_id,
            span_id,
            parent_span_id,
            cause_id,
            name_hash,
            record_type,
            num_attributes: 0,
            attributes: [Attribute::EMPTY; MAX_ATTRIBUTES_PER_TRACELET],
        }
    }

    /// The populated prefix of the inline attribute array.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes[..self.num_attributes as usize]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::attrs::AttrValue;

    fn attrs_with(count: usize) -> [Attribute; MAX_ATTRIBUTES_PER_TRACELET] {
        let mut attrs = [Attribute::EMPTY; MAX_ATTRIBUTES_PER_TRACELET];
        for (i, slot) in attrs.iter_mut().enumerate().take(count) {
            *slot = Attribute {
                key: (i + 1) as u64,
                value: AttrValue::I64(i as i64),
            };
        }
        attrs
    }

    #[test]
    fn record_is_cache_line_sized_and_aligned() {
        assert_eq!(std::mem::size_of::<Tracelet>() % CACHE_LINE_SIZE, 0);
        assert_eq!(std::mem::align_of::<Tracelet>(), CACHE_LINE_SIZE);
    }

    #[test]
    fn unused_attribute_slots_hold_the_sentinel() {
        let tracelet = Tracelet::with_attributes(
            1,
            Id(1),
            Id(2),
            Id::INVALID,
            Id::INVALID,
            99,
            RecordType::SpanStart,
            &attrs_with(2),
            2,
        );
        assert_eq!(tracelet.attributes().len(), 2);
        assert_eq!(tracelet.attributes()[0].key, 1);
        assert_eq!(tracelet.attributes()[1].key, 2);
        for slot in &tracelet.attributes[2..] {
            assert_eq!(*slot, Attribute::EMPTY);
        }
    }

    #[test]
    fn attribute_count_is_clamped_to_capacity() {
        let tracelet = Tracelet::with_attributes(
            1,
            Id(1),
            Id(2),
            Id::INVALID,
            Id::INVALID,
            99,
            RecordType::Event,
            &attrs_with(MAX_ATTRIBUTES_PER_TRACELET),
            (MAX_ATTRIBUTES_PER_TRACELET + 3) as u8,
        );
        assert_eq!(
            tracelet.attributes().len(),
            MAX_ATTRIBUTES_PER_TRACELET
        );
    }

    #[test]
    fn span_end_records_carry_no_attributes() {
        let tracelet = Tracelet::without_attributes(
            7,
            Id(1),
            Id(2),
            Id::INVALID,
            Id::INVALID,
            0,
            RecordType::SpanEnd,
        );
        assert_eq!(tracelet.num_attributes, 0);
        assert!(tracelet.attributes().is_empty());
        for slot in &tracelet.attributes {
            assert_eq!(*slot, Attribute::EMPTY);
        }
    }
}
