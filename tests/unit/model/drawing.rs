use super::*;

fn stroke(y: f64) -> DrawStroke {
    DrawStroke {
        points: vec![Point::new(0.0, y), Point::new(10.0, y)],
        color: Rgba8::BLACK,
        width: 3.0,
    }
}

#[test]
fn local_history_undoes_and_redoes_strokes() {
    let mut tool = DrawingSession::begin(None);
    assert!(tool.add_stroke(stroke(1.0)));
    assert!(tool.add_stroke(stroke(2.0)));
    assert!(tool.undo_stroke());
    assert_eq!(tool.working().strokes.len(), 1);
    assert!(tool.redo_stroke());
    assert_eq!(tool.working().strokes.len(), 2);
    assert!(!tool.redo_stroke());
}

#[test]
fn degenerate_strokes_are_ignored() {
    let mut tool = DrawingSession::begin(None);
    let mut s = stroke(1.0);
    s.points.truncate(1);
    assert!(!tool.add_stroke(s));
    let mut s = stroke(1.0);
    s.width = 0.0;
    assert!(!tool.add_stroke(s));
    assert!(!tool.is_dirty());
    assert!(tool.finish().is_none());
}

#[test]
fn finish_reports_previous_and_new() {
    let before = Drawing {
        strokes: vec![stroke(5.0)],
    };
    let mut tool = DrawingSession::begin(Some(&before));
    tool.add_stroke(stroke(6.0));
    let (prev, new) = tool.finish().unwrap();
    assert_eq!(prev, Some(before));
    assert_eq!(new.unwrap().strokes.len(), 2);
}

#[test]
fn clearing_everything_yields_no_overlay() {
    let before = Drawing {
        strokes: vec![stroke(5.0)],
    };
    let mut tool = DrawingSession::begin(Some(&before));
    tool.clear();
    let (prev, new) = tool.finish().unwrap();
    assert!(prev.is_some());
    assert!(new.is_none());
}

#[test]
fn undo_back_to_start_is_not_dirty() {
    let mut tool = DrawingSession::begin(None);
    tool.add_stroke(stroke(1.0));
    tool.undo_stroke();
    assert!(!tool.is_dirty());
}
