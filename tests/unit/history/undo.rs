use super::*;
use crate::assets::store::MemoryAssetStore;
use crate::foundation::core::{Rgba8, Size};
use crate::geometry::transform::Transform;
use crate::model::drawing::DrawStroke;
use crate::model::layer::{ImageLayer, TextLayer};

fn canvas_with_image() -> (Canvas, LayerId) {
    let mut c = Canvas::new(100.0, 100.0).unwrap();
    let id = c.add_image(
        ImageLayer::new("a.png", 40, 30, Size::new(40.0, 30.0)),
        Transform::IDENTITY,
    );
    (c, id)
}

#[test]
fn log_is_lifo() {
    let mut log = UndoLog::new();
    assert!(log.is_empty());
    log.push(UndoAction::AddImage { layer: LayerId(1) });
    log.push(UndoAction::Draw { previous: None });
    assert_eq!(log.kinds(), vec![ActionKind::AddImage, ActionKind::Draw]);
    assert_eq!(log.pop().map(|a| a.kind()), Some(ActionKind::Draw));
    assert_eq!(log.len(), 1);
    log.clear();
    assert!(log.pop().is_none());
}

#[test]
fn undo_add_removes_layer() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    assert!(UndoAction::AddImage { layer: id }.revert(&mut c, &mut cache, &store));
    assert!(c.is_empty());
    assert!(!UndoAction::AddImage { layer: id }.revert(&mut c, &mut cache, &store));
}

#[test]
fn undo_delete_reinserts_at_index_or_appends() {
    let (mut c, id) = canvas_with_image();
    let t = c.add_text(
        TextLayer {
            text: "hi".into(),
            font: "f.ttf".into(),
            size: 12.0,
            color: Rgba8::BLACK,
        },
        Transform::IDENTITY,
    );
    let before = c.clone();
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();

    let (index, layer) = c.remove_layer(id).unwrap();
    assert!(UndoAction::DeleteImage { layer, index }.revert(&mut c, &mut cache, &store));
    assert_eq!(c, before);

    let (_, layer) = c.remove_layer(t).unwrap();
    assert!(UndoAction::DeleteText { layer, index: 99 }.revert(&mut c, &mut cache, &store));
    assert_eq!(c.layers().last().map(|l| l.id), Some(t));
}

#[test]
fn undo_split_restores_original_and_drops_pieces() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    let (index, original) = c.remove_layer(id).unwrap();
    let mut a = original.clone();
    a.id = c.allocate_id();
    a.as_image_mut().unwrap().source = "a_tear1a.png".into();
    let mut b = original.clone();
    b.id = c.allocate_id();
    b.as_image_mut().unwrap().source = "a_tear2b.png".into();
    store.write("a.png", b"orig").unwrap();
    store.write("a_tear1a.png", b"in").unwrap();
    store.write("a_tear2b.png", b"out").unwrap();
    c.push_layer(a.clone());
    c.push_layer(b.clone());

    let undone = UndoAction::Split {
        original: original.clone(),
        original_index: index,
        children: [a, b],
    }
    .revert(&mut c, &mut cache, &store);

    assert!(undone);
    assert_eq!(c.layers(), std::slice::from_ref(&original));
    assert_eq!(store.names(), vec!["a.png".to_owned()]);
    // Piece ids stay retired.
    assert!(c.allocate_id().0 > 3);
}

#[test]
fn undo_split_refuses_when_original_id_is_taken() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    let original = c.layer(id).unwrap().clone();
    let before = c.clone();
    let undone = UndoAction::Split {
        original: original.clone(),
        original_index: 0,
        children: [original.clone(), original],
    }
    .revert(&mut c, &mut cache, &store);
    assert!(!undone);
    assert_eq!(c, before);
}

#[test]
fn undo_erase_restores_previous_reference() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    let before = c.clone();
    store.write("a_mask1.png", b"m").unwrap();
    c.layer_mut(id).unwrap().as_image_mut().unwrap().mask = Some("a_mask1.png".into());
    let undone = UndoAction::Erase {
        layer: id,
        previous_mask: None,
        previous_erased: None,
    }
    .revert(&mut c, &mut cache, &store);
    assert!(undone);
    assert_eq!(c, before);
    assert!(!store.exists("a_mask1.png"));
}

#[test]
fn undo_remove_background_restores_source_and_mask() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    store.write("a.png", b"orig").unwrap();
    store.write("a_nobg1.png", b"cut").unwrap();
    c.layer_mut(id).unwrap().as_image_mut().unwrap().source = "a_nobg1.png".into();
    let mut cache = BitmapCache::default();
    let undone = UndoAction::RemoveBackground {
        layer: id,
        previous_source: "a.png".into(),
        previous_mask: Some("m.png".into()),
        previous_erased: None,
    }
    .revert(&mut c, &mut cache, &store);
    assert!(undone);
    let img = c.layer(id).unwrap().as_image().unwrap();
    assert_eq!(img.source, "a.png");
    assert_eq!(img.mask.as_deref(), Some("m.png"));
    assert_eq!(store.read("a.png").unwrap(), b"orig");
    assert!(!store.exists("a_nobg1.png"));
}

#[test]
fn undo_remove_background_without_backup_is_noop() {
    let (mut c, id) = canvas_with_image();
    let store = MemoryAssetStore::new();
    store.write("a.png", b"cut").unwrap();
    let mut cache = BitmapCache::default();
    let before = c.clone();
    let undone = UndoAction::RemoveBackground {
        layer: id,
        previous_source: "gone.png".into(),
        previous_mask: Some("m.png".into()),
        previous_erased: None,
    }
    .revert(&mut c, &mut cache, &store);
    assert!(!undone);
    assert_eq!(c, before);
    assert_eq!(store.read("a.png").unwrap(), b"cut");
}

#[test]
fn undo_draw_restores_snapshot() {
    let mut c = Canvas::new(10.0, 10.0).unwrap();
    let prev = Drawing {
        strokes: vec![DrawStroke {
            points: vec![(0.0, 0.0).into(), (5.0, 5.0).into()],
            color: Rgba8::BLACK,
            width: 2.0,
        }],
    };
    c.drawing = Some(prev.clone());
    let before = c.clone();
    c.drawing = None;
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    assert!(
        UndoAction::Draw {
            previous: Some(prev),
        }
        .revert(&mut c, &mut cache, &store)
    );
    assert_eq!(c, before);
}
