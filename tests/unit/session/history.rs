use super::*;

#[test]
fn undo_then_redo_restores_states() {
    let mut h = History::new(8);
    let mut cur = 0;
    for next in 1..=3 {
        h.record(cur);
        cur = next;
    }
    cur = h.undo(cur).unwrap();
    assert_eq!(cur, 2);
    cur = h.undo(cur).unwrap();
    assert_eq!(cur, 1);
    cur = h.redo(cur).unwrap();
    assert_eq!(cur, 2);
    assert!(h.can_redo());
}

#[test]
fn depth_bounds_undo() {
    let mut h = History::new(2);
    let mut cur = 0;
    for next in 1..=5 {
        h.record(cur);
        cur = next;
    }
    cur = h.undo(cur).unwrap();
    cur = h.undo(cur).unwrap();
    assert_eq!(cur, 3);
    assert_eq!(h.undo(cur), Err(3));
}

#[test]
fn recording_discards_redo_branch() {
    let mut h = History::new(4);
    h.record(0);
    let cur = h.undo(1).unwrap();
    assert!(h.can_redo());
    h.record(cur);
    assert!(!h.can_redo());
    assert_eq!(h.redo(9), Err(9));
}

#[test]
fn zero_depth_records_nothing() {
    let mut h = History::new(0);
    h.record(1);
    assert!(!h.can_undo());
}

#[test]
fn for_each_mut_touches_both_stacks() {
    let mut h = History::new(4);
    h.record(1);
    h.record(2);
    let _ = h.undo(3).unwrap();
    h.for_each_mut(|v| *v *= 10);
    assert_eq!(h.undo(0), Ok(10));
    h.clear();
    assert!(!h.can_undo() && !h.can_redo());
}

#[test]
fn iter_mut_visits_newest_undo_state_first() {
    let mut h = History::new(4);
    h.record(1);
    h.record(2);
    let _ = h.undo(3).unwrap();
    let seen: Vec<i32> = h.iter_mut().map(|v| *v).collect();
    assert_eq!(seen, vec![1, 3]);
}
