// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render_to_string(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn empty_table_renders_nothing() {
    let table = Table::plain(vec![Column::left("ID")]);
    assert_eq!(render_to_string(&table), "");
}

#[test]
fn pads_columns_to_widest_cell() {
    let mut table = Table::plain(vec![Column::left("ID"), Column::left("STATE")]);
    table.row(vec!["abcdef12".to_string(), "pending".to_string()]);
    table.row(vec!["a1".to_string(), "completed".to_string()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID        STATE");
    assert_eq!(lines[1], "abcdef12  pending");
    assert_eq!(lines[2], "a1        completed");
}

#[test]
fn right_align_pads_on_the_left() {
    let mut table = Table::plain(vec![Column::right("ATTEMPTS")]);
    table.row(vec!["3".to_string()]);
    let out = render_to_string(&table);
    assert_eq!(out.lines().next().unwrap(), "ATTEMPTS");
    assert_eq!(out.lines().nth(1).unwrap(), "       3");
}

#[test]
fn truncates_values_past_max_width() {
    let mut table = Table::plain(vec![Column::left("COMMAND").with_max(5)]);
    table.row(vec!["echo hello world".to_string()]);
    let out = render_to_string(&table);
    assert_eq!(out.lines().nth(1).unwrap(), "echo ");
}

#[test]
fn last_left_column_is_never_padded() {
    let mut table = Table::plain(vec![Column::left("ID"), Column::left("COMMAND")]);
    table.row(vec!["a1".to_string(), "echo hi".to_string()]);
    table.row(vec!["a2".to_string(), "x".to_string()]);
    let out = render_to_string(&table);
    assert!(out.lines().nth(1).unwrap().ends_with("echo hi"));
    assert!(!out.lines().nth(2).unwrap().ends_with("x       "));
}
