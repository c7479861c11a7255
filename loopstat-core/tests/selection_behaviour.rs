//! Behaviour tests for window selection and per-period ranking.

use std::cell::RefCell;
use std::num::NonZeroUsize;

use loopstat_core::{
    Aggregation, EntityTotals, Observation, ObservationTable, Period, PeriodRankings,
    PeriodWindow, aggregate_for_ranking, select_recent_periods, top_n_per_period,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const ENTITIES: i32 = 15;

fn waste_table(first: i32, last: i32) -> ObservationTable {
    (first..=last)
        .flat_map(|year| {
            (0..ENTITIES).map(move |index| {
                // Entity 0 carries the largest base value; later years add a little on top.
                let value = f64::from((ENTITIES - index) * 100 + (year - first));
                Observation::new(format!("Entity {index:02}"), year, value)
            })
        })
        .collect()
}

fn twenty() -> NonZeroUsize {
    NonZeroUsize::new(20).expect("non-zero window")
}

#[fixture]
fn table() -> RefCell<ObservationTable> {
    RefCell::new(ObservationTable::default())
}

#[fixture]
fn window() -> RefCell<Option<PeriodWindow>> {
    RefCell::new(None)
}

#[fixture]
fn rankings() -> RefCell<Option<PeriodRankings>> {
    RefCell::new(None)
}

#[fixture]
fn totals() -> RefCell<Option<EntityTotals>> {
    RefCell::new(None)
}

#[given("a waste table spanning 2001 to 2025")]
fn given_long_table(#[from(table)] table: &RefCell<ObservationTable>) {
    *table.borrow_mut() = waste_table(2001, 2025);
}

#[given("a waste table spanning 2019 to 2021")]
fn given_short_table(#[from(table)] table: &RefCell<ObservationTable>) {
    *table.borrow_mut() = waste_table(2019, 2021);
}

#[when("I select the twenty most recent periods")]
fn when_select(
    #[from(table)] table: &RefCell<ObservationTable>,
    #[from(window)] window: &RefCell<Option<PeriodWindow>>,
) {
    *window.borrow_mut() = Some(select_recent_periods(&table.borrow(), twenty()));
}

#[when("I rank the top ten entities per period")]
fn when_rank(
    #[from(table)] table: &RefCell<ObservationTable>,
    #[from(window)] window: &RefCell<Option<PeriodWindow>>,
    #[from(rankings)] rankings: &RefCell<Option<PeriodRankings>>,
) {
    let selected = window.borrow();
    let periods = selected.as_ref().expect("window selected");
    let top_ten = NonZeroUsize::new(10).expect("non-zero top-n");
    *rankings.borrow_mut() = Some(top_n_per_period(&table.borrow(), periods, top_ten));
}

#[when("I sum each entity over the window")]
fn when_sum(
    #[from(table)] table: &RefCell<ObservationTable>,
    #[from(window)] window: &RefCell<Option<PeriodWindow>>,
    #[from(totals)] totals: &RefCell<Option<EntityTotals>>,
) {
    let selected = window.borrow();
    let periods = selected.as_ref().expect("window selected");
    *totals.borrow_mut() = Some(aggregate_for_ranking(
        &table.borrow(),
        periods,
        Aggregation::Sum,
    ));
}

fn assert_window(window: &RefCell<Option<PeriodWindow>>, first: i32, last: i32) {
    let selected = window.borrow();
    let periods = selected.as_ref().expect("window selected");
    assert_eq!(periods.first(), Some(Period::new(first)));
    assert_eq!(periods.last(), Some(Period::new(last)));
    let expected_len = usize::try_from(last - first + 1).expect("positive span");
    assert_eq!(periods.len(), expected_len);
}

#[then("the window runs from 2006 to 2025")]
fn then_long_window(#[from(window)] window: &RefCell<Option<PeriodWindow>>) {
    assert_window(window, 2006, 2025);
}

#[then("the window runs from 2019 to 2021")]
fn then_short_window(#[from(window)] window: &RefCell<Option<PeriodWindow>>) {
    assert_window(window, 2019, 2021);
}

#[then("every ranked period holds ten entities in descending order")]
fn then_ranked(#[from(rankings)] rankings: &RefCell<Option<PeriodRankings>>) {
    let ranked = rankings.borrow();
    let sets = ranked.as_ref().expect("rankings computed");
    assert_eq!(sets.len(), 20);
    for set in sets {
        assert_eq!(set.len(), 10);
        assert!(
            set.entries
                .windows(2)
                .all(|pair| matches!(pair, [a, b] if a.value >= b.value))
        );
    }
}

#[then("the largest total belongs to the entity with the highest base value")]
fn then_largest(#[from(totals)] totals: &RefCell<Option<EntityTotals>>) {
    let computed = totals.borrow();
    let ranked = computed.as_ref().expect("totals computed").ranked();
    assert_eq!(
        ranked.first().map(|entry| entry.entity.as_str()),
        Some("Entity 00")
    );
    assert_eq!(ranked.len(), 15);
}

#[scenario(path = "tests/features/selection.feature", index = 0)]
fn window_keeps_twenty_years(
    table: RefCell<ObservationTable>,
    window: RefCell<Option<PeriodWindow>>,
) {
    let _ = (table, window);
}

#[scenario(path = "tests/features/selection.feature", index = 1)]
fn short_table_keeps_every_year(
    table: RefCell<ObservationTable>,
    window: RefCell<Option<PeriodWindow>>,
) {
    let _ = (table, window);
}

#[scenario(path = "tests/features/selection.feature", index = 2)]
fn each_period_ranks_its_own_top_ten(
    table: RefCell<ObservationTable>,
    window: RefCell<Option<PeriodWindow>>,
    rankings: RefCell<Option<PeriodRankings>>,
) {
    let _ = (table, window, rankings);
}

#[scenario(path = "tests/features/selection.feature", index = 3)]
fn aggregate_ranking_sums_the_window(
    table: RefCell<ObservationTable>,
    window: RefCell<Option<PeriodWindow>>,
    totals: RefCell<Option<EntityTotals>>,
) {
    let _ = (table, window, totals);
}
