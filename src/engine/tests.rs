use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::*;
use crate::calendar::MonthView;
use crate::catalog::{Expansion, SlotDefinition};
use crate::model::*;
use crate::observability::UNKNOWN_SLOT_TOTAL;
use chrono::NaiveDate;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};

fn d(y: i32, m: u32, day: u32) -> Day {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Day `n` of January 2024.
fn jan(n: u32) -> Day {
    d(2024, 1, n)
}

fn catalog() -> SlotCatalog {
    SlotCatalog::new(
        vec![
            SlotDefinition::new("MainBanner", 8).with_aliases(["메인배너"]),
            SlotDefinition::new("side-banner-1", 4),
            SlotDefinition::new("side-banner-2", 4),
            SlotDefinition::new("Newsletter Banner", 1).with_aliases(["newsletter"]),
            SlotDefinition::new("Pair", 2),
            SlotDefinition::new("Retired", 0),
        ],
        vec![Expansion {
            label: "side-banner".into(),
            slots: vec!["side-banner-1".into(), "side-banner-2".into()],
        }],
    )
    .unwrap()
}

fn booking(id: &str, slot: &str, start: Day, end: Day, status: BookingStatus) -> Booking {
    Booking::new(id, "adv", slot, start, end, status).unwrap()
}

fn confirmed(id: &str, slot: &str, start: Day, end: Day) -> Booking {
    booking(id, slot, start, end, BookingStatus::Confirmed)
}

fn draft(slot: &str, start: Day, end: Day) -> BookingDraft {
    BookingDraft::new("adv-new", slot, start, end).unwrap()
}

fn engine(catalog: &SlotCatalog) -> Engine<'_, StatusSet> {
    Engine::new(catalog, StatusSet::confirmed_and_executing())
}

// ── occupancy_on ─────────────────────────────────────────

#[test]
fn main_banner_end_to_end() {
    let c = catalog();
    let e = engine(&c);
    let bookings: Vec<Booking> = (0..5)
        .map(|i| {
            let status = if i % 2 == 0 {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Executing
            };
            booking(&format!("b{i}"), "MainBanner", jan(15), jan(25), status)
        })
        .collect();

    let r = e.occupancy_on(&bookings, "MainBanner", jan(20)).unwrap();
    assert_eq!(r.occupied, 5);
    assert_eq!(r.capacity, 8);
    assert_eq!(r.available, 3);
    assert_eq!(r.occupancy_rate, 0.625);
    assert_eq!(r.severity(), Severity::Medium);
}

#[test]
fn inclusive_boundaries_in_occupancy() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![confirmed("a", "MainBanner", jan(10), jan(20))];
    let occ = |day| e.occupancy_on(&bookings, "MainBanner", day).unwrap().occupied;
    assert_eq!(occ(jan(9)), 0);
    assert_eq!(occ(jan(10)), 1);
    assert_eq!(occ(jan(20)), 1);
    assert_eq!(occ(jan(21)), 0);
}

#[test]
fn numbered_slots_counted_separately() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "side-banner-1", jan(1), jan(10)),
        confirmed("b", "side-banner-1", jan(5), jan(10)),
        confirmed("c", "side-banner-2", jan(1), jan(10)),
    ];
    let one = e.occupancy_on(&bookings, "side-banner-1", jan(6)).unwrap();
    let two = e.occupancy_on(&bookings, "side-banner-2", jan(6)).unwrap();
    assert_eq!(one.occupied, 2);
    assert_eq!(two.occupied, 1);
    assert_eq!(one.capacity, 4);
}

#[test]
fn alias_counts_against_canonical() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "MainBanner", jan(1), jan(3)),
        confirmed("b", "메인배너", jan(1), jan(3)),
    ];
    assert_eq!(e.occupancy_on(&bookings, "MainBanner", jan(2)).unwrap().occupied, 2);
}

#[test]
fn expansion_counts_against_every_target() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![confirmed("fam", "side-banner", jan(1), jan(3))];
    assert_eq!(e.occupancy_on(&bookings, "side-banner-1", jan(2)).unwrap().occupied, 1);
    assert_eq!(e.occupancy_on(&bookings, "side-banner-2", jan(2)).unwrap().occupied, 1);
}

#[test]
fn non_occupying_statuses_excluded() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        booking("i", "MainBanner", jan(1), jan(5), BookingStatus::Inquiry),
        booking("q", "MainBanner", jan(1), jan(5), BookingStatus::Quoted),
        booking("x", "MainBanner", jan(1), jan(5), BookingStatus::Cancelled),
        booking("o", "MainBanner", jan(1), jan(5), BookingStatus::Other("보류".into())),
        booking("e", "MainBanner", jan(1), jan(5), BookingStatus::Executing),
    ];
    assert_eq!(e.occupancy_on(&bookings, "MainBanner", jan(3)).unwrap().occupied, 1);
}

#[test]
fn caller_supplied_predicate() {
    let c = catalog();
    let everything_but_cancelled = |s: &BookingStatus| *s != BookingStatus::Cancelled;
    let e = Engine::new(&c, everything_but_cancelled);
    let bookings = vec![
        booking("q", "MainBanner", jan(1), jan(5), BookingStatus::Quoted),
        booking("x", "MainBanner", jan(1), jan(5), BookingStatus::Cancelled),
    ];
    assert_eq!(e.occupancy_on(&bookings, "MainBanner", jan(3)).unwrap().occupied, 1);
}

#[test]
fn unknown_slot_names_in_snapshot_are_ignored() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "MainBanner", jan(1), jan(5)),
        confirmed("ghost", "메인 배너", jan(1), jan(5)),
    ];
    assert_eq!(e.occupancy_on(&bookings, "MainBanner", jan(3)).unwrap().occupied, 1);
}

#[test]
fn query_for_unknown_or_alias_slot() {
    let c = catalog();
    let e = engine(&c);
    assert_eq!(
        e.occupancy_on(&[], "Popup", jan(1)),
        Err(EngineError::UnknownSlot("Popup".into()))
    );
    // Queries name canonical slots; aliases are for recorded bookings.
    assert!(matches!(
        e.occupancy_on(&[], "메인배너", jan(1)),
        Err(EngineError::UnknownSlot(_))
    ));
}

#[test]
fn occupancy_is_idempotent_and_order_free() {
    let c = catalog();
    let e = engine(&c);
    let mut bookings = vec![
        confirmed("a", "Pair", jan(1), jan(5)),
        confirmed("b", "Pair", jan(3), jan(9)),
        booking("c", "Pair", jan(2), jan(4), BookingStatus::Inquiry),
    ];
    let first = e.occupancy_on(&bookings, "Pair", jan(4)).unwrap();
    let second = e.occupancy_on(&bookings, "Pair", jan(4)).unwrap();
    assert_eq!(first, second);
    bookings.reverse();
    assert_eq!(e.occupancy_on(&bookings, "Pair", jan(4)).unwrap(), first);
}

#[test]
fn capacity_zero_is_always_full() {
    let c = catalog();
    let e = engine(&c);
    let r = e.occupancy_on(&[], "Retired", jan(1)).unwrap();
    assert_eq!(r.available, 0);
    assert_eq!(r.occupancy_rate, 1.0);
    assert_eq!(r.severity(), Severity::Full);
}

// ── active_on ────────────────────────────────────────────

#[test]
fn active_on_lists_every_status_and_slot() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "MainBanner", jan(1), jan(5)),
        booking("b", "unknown", jan(5), jan(6), BookingStatus::Inquiry),
        confirmed("c", "Pair", jan(6), jan(9)),
    ];
    let ids: Vec<&str> = e.active_on(&bookings, jan(5)).iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

// ── can_accept ───────────────────────────────────────────

#[test]
fn capacity_checked_per_day() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("A", "Pair", jan(1), jan(5)),
        confirmed("B", "Pair", jan(4), jan(8)),
    ];

    let ok = e.can_accept(&bookings, &draft("Pair", jan(1), jan(3))).unwrap();
    assert_eq!(ok.slots.len(), 1);
    assert_eq!(ok.slots[0].slot, "Pair");
    assert_eq!(ok.slots[0].peak_after, 2);

    match e.can_accept(&bookings, &draft("Pair", jan(4), jan(5))) {
        Err(EngineError::CapacityExceeded {
            slot,
            capacity,
            dates,
            conflicting,
        }) => {
            assert_eq!(slot, "Pair");
            assert_eq!(capacity, 2);
            assert_eq!(dates, vec![jan(4), jan(5)]);
            let ids: Vec<&str> = conflicting.iter().map(|b| b.id.as_str()).collect();
            assert_eq!(ids, vec!["A", "B"]);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn full_day_in_middle_of_long_draft_rejects() {
    // Two short bookings saturate day 5 only; the draft spans 1..10.
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("x", "Pair", jan(5), jan(5)),
        confirmed("y", "Pair", jan(3), jan(5)),
        confirmed("z", "Pair", jan(8), jan(9)),
    ];
    match e.can_accept(&bookings, &draft("Pair", jan(1), jan(10))) {
        Err(EngineError::CapacityExceeded {
            dates, conflicting, ..
        }) => {
            assert_eq!(dates, vec![jan(5)]);
            assert_eq!(conflicting.len(), 2);
            assert!(conflicting.iter().all(|b| b.id != "z"));
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn adjacent_bookings_leave_room() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "Newsletter Banner", jan(1), jan(3)),
        confirmed("b", "Newsletter Banner", jan(7), jan(9)),
    ];
    assert!(e.can_accept(&bookings, &draft("newsletter", jan(4), jan(6))).is_ok());
    assert!(e.can_accept(&bookings, &draft("newsletter", jan(3), jan(4))).is_err());
    assert!(e.can_accept(&bookings, &draft("newsletter", jan(6), jan(7))).is_err());
}

#[test]
fn non_occupying_bookings_do_not_block() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        booking("q", "Newsletter Banner", jan(1), jan(9), BookingStatus::Quoted),
        booking("x", "Newsletter Banner", jan(1), jan(9), BookingStatus::Cancelled),
    ];
    assert!(e.can_accept(&bookings, &draft("Newsletter Banner", jan(2), jan(3))).is_ok());
}

#[test]
fn unknown_draft_slot_rejected() {
    let c = catalog();
    let e = engine(&c);
    assert_eq!(
        e.can_accept(&[], &draft("side-banner-3", jan(1), jan(2))),
        Err(EngineError::UnknownSlot("side-banner-3".into()))
    );
}

#[test]
fn capacity_zero_always_rejects() {
    let c = catalog();
    let e = engine(&c);
    assert_eq!(
        e.can_accept(&[], &draft("Retired", jan(1), jan(1))),
        Err(EngineError::CapacityZero("Retired".into()))
    );
    let bookings = vec![booking("q", "Retired", jan(1), jan(2), BookingStatus::Inquiry)];
    assert!(e.can_accept(&bookings, &draft("Retired", jan(5), jan(6))).is_err());
}

#[test]
fn expansion_draft_needs_room_on_every_target() {
    let c = catalog();
    let e = engine(&c);
    let mut bookings: Vec<Booking> = (0..4)
        .map(|i| confirmed(&format!("s2-{i}"), "side-banner-2", jan(10), jan(12)))
        .collect();

    match e.can_accept(&bookings, &draft("side-banner", jan(12), jan(14))) {
        Err(EngineError::CapacityExceeded { slot, dates, .. }) => {
            assert_eq!(slot, "side-banner-2");
            assert_eq!(dates, vec![jan(12)]);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }

    bookings.pop();
    let ok = e.can_accept(&bookings, &draft("side-banner", jan(12), jan(14))).unwrap();
    let peaks: Vec<(&str, u32)> = ok.slots.iter().map(|s| (s.slot.as_str(), s.peak_after)).collect();
    assert_eq!(peaks, vec![("side-banner-1", 1), ("side-banner-2", 4)]);
}

#[test]
fn cross_month_draft() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![confirmed("feb", "Newsletter Banner", d(2024, 2, 1), d(2024, 2, 3))];
    match e.can_accept(&bookings, &draft("Newsletter Banner", jan(30), d(2024, 2, 1))) {
        Err(EngineError::CapacityExceeded { dates, .. }) => assert_eq!(dates, vec![d(2024, 2, 1)]),
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
    assert!(e.can_accept(&bookings, &draft("Newsletter Banner", jan(30), jan(31))).is_ok());
}

#[test]
fn overly_wide_draft_rejected() {
    let c = catalog();
    let e = engine(&c);
    assert_eq!(
        e.can_accept(&[], &draft("MainBanner", d(2020, 1, 1), d(2030, 1, 1))),
        Err(EngineError::LimitExceeded("date range too wide"))
    );
}

// ── span reports ─────────────────────────────────────────

#[test]
fn span_report_over_range() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("A", "Pair", jan(1), jan(5)),
        confirmed("B", "Pair", jan(4), jan(8)),
    ];
    let range = DateRange::new(jan(1), jan(10)).unwrap();
    let report = e.occupancy_over(&bookings, "Pair", &range).unwrap();

    let occupied: Vec<u32> = report.days.iter().map(|r| r.occupied).collect();
    assert_eq!(occupied, vec![1, 1, 1, 2, 2, 1, 1, 1, 0, 0]);
    assert_eq!(report.peak().unwrap().date, jan(4));
    assert_eq!(report.full_days().count(), 2);
    assert_eq!(report.overbooked_days().count(), 0);
    assert!((report.mean_rate() - 0.5).abs() < 1e-9);

    // Same answers as the single-day query.
    for day in &report.days {
        assert_eq!(*day, e.occupancy_on(&bookings, "Pair", day.date).unwrap());
    }
}

#[test]
fn overbooked_slot_days() {
    let c = catalog();
    let e = engine(&c);
    // Written straight to the store, bypassing the check.
    let bookings = vec![
        confirmed("a", "newsletter", jan(1), jan(2)),
        confirmed("b", "Newsletter Banner", jan(2), jan(3)),
        confirmed("c", "Pair", jan(2), jan(2)),
    ];
    let range = DateRange::new(jan(1), jan(31)).unwrap();
    let over = e.overbooked(&bookings, &range).unwrap();
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].slot, "Newsletter Banner");
    assert_eq!(over[0].date, jan(2));
    assert_eq!(over[0].occupied, 2);
    assert_eq!(over[0].available, 0);
    assert_eq!(over[0].severity(), Severity::Full);
}

// ── unknown slot names ───────────────────────────────────

/// Recorder tallying a single counter by name.
struct Tally {
    name: &'static str,
    hits: Arc<AtomicU64>,
}

impl Recorder for Tally {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        if key.name() == self.name {
            Counter::from_arc(self.hits.clone())
        } else {
            Counter::noop()
        }
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

fn unknown_slot_count(f: impl FnOnce()) -> u64 {
    let recorder = Tally {
        name: UNKNOWN_SLOT_TOTAL,
        hits: Arc::new(AtomicU64::new(0)),
    };
    metrics::with_local_recorder(&recorder, f);
    recorder.hits.load(Ordering::Relaxed)
}

#[test]
fn unknown_slot_counted_once_per_query() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![
        confirmed("a", "MainBanner", jan(1), jan(5)),
        confirmed("stray", "배너광고", jan(2), jan(3)),
        // Would not occupy space under any name.
        booking("quote", "배너광고", jan(2), jan(3), BookingStatus::Quoted),
    ];
    let range = DateRange::new(jan(1), jan(31)).unwrap();

    let month = unknown_slot_count(|| {
        MonthView::build(&e, &bookings, 2024, 1).unwrap();
    });
    assert_eq!(month, 1);

    let over = unknown_slot_count(|| {
        e.overbooked(&bookings, &range).unwrap();
    });
    assert_eq!(over, 1);

    // Fan-out draft touching two slots.
    let accept = unknown_slot_count(|| {
        e.can_accept(&bookings, &draft("side-banner", jan(2), jan(3))).unwrap();
    });
    assert_eq!(accept, 1);

    let on = unknown_slot_count(|| {
        e.occupancy_on(&bookings, "MainBanner", jan(2)).unwrap();
    });
    assert_eq!(on, 1);
}

#[test]
fn known_slots_leave_unknown_counter_alone() {
    let c = catalog();
    let e = engine(&c);
    let bookings = vec![confirmed("a", "메인배너", jan(1), jan(5))];
    let n = unknown_slot_count(|| {
        MonthView::build(&e, &bookings, 2024, 1).unwrap();
    });
    assert_eq!(n, 0);
}
