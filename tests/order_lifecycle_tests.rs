use std::collections::HashSet;

use qr_dine::{
    error::ApiError,
    models::{CreateOrderRequest, OrderItemInput},
    orders::{self, OrderStatus, OrderType},
};
use uuid::Uuid;

// --- Totals ---

#[test]
fn totals_are_a_pure_function_of_the_inputs() {
    let items = [(250.0, 2), (100.0, 5)];
    let first = orders::compute_totals(&items, OrderType::DineIn);
    let second = orders::compute_totals(&items, OrderType::DineIn);
    assert_eq!(first, second);
}

#[test]
fn tax_is_exactly_ten_percent_of_the_subtotal() {
    // Subtotal 1000 → tax 100.00 exactly.
    let totals = orders::compute_totals(&[(500.0, 2)], OrderType::Takeaway);
    assert_eq!(totals.subtotal, 1000.0);
    assert_eq!(totals.tax, 100.0);
    assert_eq!(totals.delivery_fee, 0.0);
    assert_eq!(totals.total, 1100.0);
}

#[test]
fn delivery_adds_a_flat_fee_regardless_of_subtotal() {
    let small = orders::compute_totals(&[(10.0, 1)], OrderType::Delivery);
    let large = orders::compute_totals(&[(10_000.0, 3)], OrderType::Delivery);
    assert_eq!(small.delivery_fee, 50.0);
    assert_eq!(large.delivery_fee, 50.0);
    assert_eq!(small.total, 10.0 + 1.0 + 50.0);
}

#[test]
fn dine_in_and_takeaway_carry_no_delivery_fee() {
    assert_eq!(
        orders::compute_totals(&[(300.0, 1)], OrderType::DineIn).delivery_fee,
        0.0
    );
    assert_eq!(
        orders::compute_totals(&[(300.0, 1)], OrderType::Takeaway).delivery_fee,
        0.0
    );
}

// --- Order numbers ---

#[test]
fn order_numbers_are_distinct_even_within_the_same_millisecond() {
    // A tight loop generates far more than one number per millisecond; the
    // process-wide sequence keeps them distinct anyway.
    let numbers: HashSet<String> = (0..500).map(|_| orders::next_order_number()).collect();
    assert_eq!(numbers.len(), 500);
    assert!(numbers.iter().all(|n| n.starts_with("ORD-")));
}

// --- Transition graph ---

#[test]
fn the_happy_path_walks_the_full_graph() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Confirmed.can_transition_to(Preparing));
    assert!(Preparing.can_transition_to(Ready));
    assert!(Ready.can_transition_to(Delivered));
}

#[test]
fn cancellation_is_reachable_from_every_non_terminal_state() {
    use OrderStatus::*;
    for state in [Pending, Confirmed, Preparing, Ready] {
        assert!(
            state.can_transition_to(Cancelled),
            "{state} should be cancellable"
        );
    }
}

#[test]
fn terminal_states_admit_no_successors() {
    use OrderStatus::*;
    let all = [Pending, Confirmed, Preparing, Ready, Delivered, Cancelled];
    for terminal in [Delivered, Cancelled] {
        assert!(terminal.is_terminal());
        for next in all {
            assert!(
                !terminal.can_transition_to(next),
                "{terminal} must not transition to {next}"
            );
        }
    }
}

#[test]
fn skipping_ahead_and_moving_backwards_are_illegal() {
    use OrderStatus::*;
    assert!(!Pending.can_transition_to(Delivered));
    assert!(!Pending.can_transition_to(Preparing));
    assert!(!Pending.can_transition_to(Ready));
    assert!(!Confirmed.can_transition_to(Pending));
    assert!(!Ready.can_transition_to(Preparing));
    // A status never transitions to itself.
    for state in [Pending, Confirmed, Preparing, Ready] {
        assert!(!state.can_transition_to(state));
    }
}

#[test]
fn status_strings_round_trip_through_parse_and_display() {
    use OrderStatus::*;
    for state in [Pending, Confirmed, Preparing, Ready, Delivered, Cancelled] {
        let parsed: OrderStatus = state.to_string().parse().unwrap();
        assert_eq!(parsed, state);
    }
    assert!("BOGUS".parse::<OrderStatus>().is_err());
}

// --- Placement validation ---

fn request(order_type: OrderType) -> CreateOrderRequest {
    CreateOrderRequest {
        branch_id: Uuid::new_v4(),
        table_id: Some(Uuid::new_v4()),
        order_type,
        customer_name: "Alice".into(),
        customer_phone: "+8801234567890".into(),
        customer_email: None,
        delivery_address: None,
        items: vec![OrderItemInput {
            menu_item_id: Uuid::new_v4(),
            quantity: 1,
            price: 120.0,
        }],
    }
}

fn is_validation(result: Result<(), ApiError>) -> bool {
    matches!(result, Err(ApiError::Validation(_)))
}

#[test]
fn empty_item_lists_are_rejected() {
    let mut req = request(OrderType::Takeaway);
    req.items.clear();
    assert!(is_validation(orders::validate_order_request(&req)));
}

#[test]
fn delivery_requires_an_address() {
    let mut req = request(OrderType::Delivery);
    req.delivery_address = None;
    assert!(is_validation(orders::validate_order_request(&req)));

    req.delivery_address = Some("   ".into());
    assert!(is_validation(orders::validate_order_request(&req)));

    req.delivery_address = Some("12 Gulshan Avenue".into());
    assert!(orders::validate_order_request(&req).is_ok());
}

#[test]
fn dine_in_requires_a_table() {
    let mut req = request(OrderType::DineIn);
    req.table_id = None;
    assert!(is_validation(orders::validate_order_request(&req)));
}

#[test]
fn customer_contact_fields_are_required() {
    let mut req = request(OrderType::Takeaway);
    req.customer_name = "".into();
    assert!(is_validation(orders::validate_order_request(&req)));

    let mut req = request(OrderType::Takeaway);
    req.customer_phone = " ".into();
    assert!(is_validation(orders::validate_order_request(&req)));
}

#[test]
fn non_positive_quantities_are_rejected() {
    let mut req = request(OrderType::Takeaway);
    req.items[0].quantity = 0;
    assert!(is_validation(orders::validate_order_request(&req)));
}
