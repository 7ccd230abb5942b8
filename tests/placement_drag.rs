use underlay::{
    Canvas, DragState, EditorSession, LayerPair, Point, RasterImage, Rgba8Premul, ViewScale,
};

fn session_with_canvas(width: u32, height: u32) -> EditorSession {
    let canvas = Canvas::new(width, height).unwrap();
    let bg = RasterImage::solid(
        canvas,
        Rgba8Premul {
            r: 128,
            g: 128,
            b: 128,
            a: 255,
        },
    )
    .unwrap();
    let fg = RasterImage::solid(canvas, Rgba8Premul::transparent()).unwrap();

    let mut session = EditorSession::new();
    let seq = session.begin_upload();
    session.install_layers(seq, LayerPair::new(bg, fg));
    session
}

#[test]
fn drag_preserves_the_grab_offset() {
    let mut session = session_with_canvas(800, 600);
    session.set_text_position(Point::new(100.0, 100.0));

    session.pointer_down(Point::new(110.0, 105.0));
    assert!(session.is_dragging());

    session.pointer_move(Point::new(130.0, 105.0));
    assert_eq!(session.position(), Some(Point::new(120.0, 100.0)));

    session.pointer_move(Point::new(300.0, 400.0));
    assert_eq!(session.position(), Some(Point::new(290.0, 395.0)));

    session.pointer_up();
    assert!(!session.is_dragging());
    assert_eq!(session.position(), Some(Point::new(290.0, 395.0)));
}

#[test]
fn drag_clamps_to_canvas_bounds() {
    let mut session = session_with_canvas(800, 600);
    session.set_text_position(Point::new(400.0, 300.0));

    session.pointer_down(Point::new(400.0, 300.0));
    session.pointer_move(Point::new(-50.0, 9999.0));
    assert_eq!(session.position(), Some(Point::new(0.0, 600.0)));

    session.pointer_move(Point::new(900.0, -5.0));
    assert_eq!(session.position(), Some(Point::new(800.0, 0.0)));
}

#[test]
fn motion_without_press_does_not_move_text() {
    let mut session = session_with_canvas(800, 600);
    let anchor = session.position().unwrap();

    session.pointer_move(Point::new(10.0, 10.0));
    session.pointer_move(Point::new(700.0, 500.0));
    assert_eq!(session.position(), Some(anchor));
    assert_eq!(session.drag_state(), DragState::Idle);
}

#[test]
fn pointer_leave_releases_the_drag() {
    let mut session = session_with_canvas(800, 600);
    session.set_text_position(Point::new(200.0, 200.0));

    session.pointer_down(Point::new(200.0, 200.0));
    session.pointer_move(Point::new(250.0, 220.0));
    assert_eq!(session.position(), Some(Point::new(250.0, 220.0)));

    session.pointer_leave();
    assert!(!session.is_dragging());

    // The pointer coming back in without a press must not resume the drag.
    session.pointer_move(Point::new(400.0, 400.0));
    assert_eq!(session.position(), Some(Point::new(250.0, 220.0)));
}

#[test]
fn second_press_during_drag_keeps_the_anchor() {
    let mut session = session_with_canvas(800, 600);
    session.set_text_position(Point::new(100.0, 100.0));

    session.pointer_down(Point::new(110.0, 105.0));
    session.pointer_move(Point::new(130.0, 105.0));
    assert_eq!(session.position(), Some(Point::new(120.0, 100.0)));

    session.pointer_down(Point::new(500.0, 500.0));
    session.pointer_move(Point::new(140.0, 105.0));
    assert_eq!(session.position(), Some(Point::new(130.0, 100.0)));
}

#[test]
fn display_coordinates_map_through_view_scale() {
    let mut session = session_with_canvas(800, 600);
    session.set_text_position(Point::new(100.0, 100.0));

    // The 800x600 canvas is shown in a 400x300 viewport.
    let canvas = session.canvas().unwrap();
    let scale = ViewScale::from_display_size(canvas, 400.0, 300.0).unwrap();
    assert_eq!(scale.to_canvas(Point::new(100.0, 50.0)), Point::new(200.0, 100.0));

    session.pointer_down(scale.to_canvas(Point::new(55.0, 52.5)));
    session.pointer_move(scale.to_canvas(Point::new(65.0, 52.5)));
    assert_eq!(session.position(), Some(Point::new(120.0, 100.0)));
}
