//! Glyph rendering against whatever fonts the host OS provides. Every test
//! bails out silently on hosts with no discoverable fonts.

use underlay::{
    Canvas, EditorSession, FontFamily, LayerPair, Point, RasterImage, Rgb, Rgba8Premul, ShadowSpec,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x243F_6A88_85A3_08D3u64;
    for chunk in bytes.chunks(8) {
        let mut word = [0u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        state = mix64(state ^ u64::from_le_bytes(word));
    }
    state
}

fn white_session(width: u32, height: u32) -> Option<EditorSession> {
    let mut session = EditorSession::with_system_fonts();
    if session.fonts().is_empty() {
        return None;
    }

    let canvas = Canvas::new(width, height).unwrap();
    let bg = RasterImage::solid(
        canvas,
        Rgba8Premul {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        },
    )
    .unwrap();
    let fg = RasterImage::solid(canvas, Rgba8Premul::transparent()).unwrap();
    let seq = session.begin_upload();
    session.install_layers(seq, LayerPair::new(bg, fg));
    Some(session)
}

fn darkened_pixels(frame: &RasterImage) -> usize {
    frame
        .data()
        .chunks_exact(4)
        .filter(|px| px[0] < 250)
        .count()
}

fn darkened_in(
    frame: &RasterImage,
    cols: std::ops::Range<usize>,
    rows: std::ops::Range<usize>,
) -> usize {
    let width = frame.canvas().width as usize;
    frame
        .data()
        .chunks_exact(4)
        .enumerate()
        .filter(|(i, px)| {
            rows.contains(&(i / width)) && cols.contains(&(i % width)) && px[0] < 250
        })
        .count()
}

#[test]
fn text_renders_over_the_background() {
    let Some(mut session) = white_session(320, 120) else {
        return;
    };

    let frame = session.composite().unwrap().unwrap();
    assert_eq!(frame.canvas(), Canvas::new(320, 120).unwrap());
    // The default 48 px string lays hundreds of dark pixels around the
    // anchor, not just an anti-aliasing fringe somewhere on the canvas.
    let near_anchor = darkened_in(frame, 100..220, 24..96);
    assert!(
        near_anchor > 300,
        "only {near_anchor} dark pixels near the anchor"
    );
}

#[test]
fn empty_content_renders_no_text() {
    let Some(mut session) = white_session(64, 64) else {
        return;
    };
    session.set_content("");

    let frame = session.composite().unwrap().unwrap();
    assert_eq!(darkened_pixels(frame), 0);
}

#[test]
fn glyph_rendering_is_deterministic() {
    let Some(mut session) = white_session(200, 80) else {
        return;
    };
    session.set_content("Stable");
    session.set_font_size_px(32).unwrap();
    let first = digest_u64(session.composite().unwrap().unwrap().data());

    // Force a fresh render of the same style rather than a cache hit.
    session.set_content("changed");
    session.composite().unwrap();
    session.set_content("Stable");
    let second = digest_u64(session.composite().unwrap().unwrap().data());

    assert_eq!(session.stats().renders, 3);
    assert_eq!(first, second);
}

#[test]
fn shadow_detaches_without_residue() {
    let Some(mut session) = white_session(240, 100) else {
        return;
    };
    session.set_content("Shadow");

    let plain = session.composite().unwrap().unwrap().data().to_vec();

    session
        .set_shadow(Some(ShadowSpec {
            color: Rgb::new(255, 0, 0),
            ..ShadowSpec::default()
        }))
        .unwrap();
    let shadowed = session.composite().unwrap().unwrap().data().to_vec();
    assert_ne!(plain, shadowed);

    session.set_shadow(None).unwrap();
    let plain_again = session.composite().unwrap().unwrap().data().to_vec();
    assert_eq!(plain, plain_again);
}

#[test]
fn fill_color_changes_the_rendered_text() {
    let Some(mut session) = white_session(200, 80) else {
        return;
    };
    session.set_content("Color");

    let black = digest_u64(session.composite().unwrap().unwrap().data());
    session.set_fill(Rgb::new(200, 30, 30));
    let red = digest_u64(session.composite().unwrap().unwrap().data());
    assert_ne!(black, red);
}

#[test]
fn font_size_changes_the_rendered_text() {
    let Some(mut session) = white_session(300, 160) else {
        return;
    };
    session.set_content("Size");
    session.set_font_size_px(24).unwrap();
    let small = session.composite().unwrap().unwrap().data().to_vec();

    session.set_font_size_px(96).unwrap();
    let large = session.composite().unwrap().unwrap().data().to_vec();
    assert_ne!(small, large);
}

#[test]
fn every_offered_family_renders_via_fallback() {
    let Some(mut session) = white_session(200, 80) else {
        return;
    };
    session.set_content("Aa");

    for family in FontFamily::ALL {
        session.set_font_family(family);
        let frame = session.composite().unwrap();
        assert!(frame.is_some(), "family {family} failed to composite");
    }
}

// Script boundaries split the layout into several glyph runs; each run must
// draw with its own face, whether the host serves the ideographs from a
// fallback font or as notdef boxes.
#[test]
fn mixed_script_content_still_renders() {
    let Some(mut session) = white_session(360, 120) else {
        return;
    };
    session.set_content("Sole 縦書き sole");

    let frame = session.composite().unwrap().unwrap();
    assert!(darkened_pixels(frame) > 0);
}

#[test]
fn opaque_foreground_occludes_text_at_the_anchor() {
    let mut session = EditorSession::with_system_fonts();
    if session.fonts().is_empty() {
        return;
    }

    let canvas = Canvas::new(160, 120).unwrap();
    let bg = RasterImage::solid(
        canvas,
        Rgba8Premul {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        },
    )
    .unwrap();

    // Opaque green block in the middle of an otherwise transparent cutout.
    let mut fg_px = vec![0u8; 160 * 120 * 4];
    for y in 40..80usize {
        for x in 40..120usize {
            let i = (y * 160 + x) * 4;
            fg_px[i..i + 4].copy_from_slice(&[0, 200, 0, 255]);
        }
    }
    let fg = RasterImage::from_premul_rgba8(160, 120, fg_px).unwrap();

    let seq = session.begin_upload();
    session.install_layers(seq, LayerPair::new(bg, fg));
    session.set_content("XXXX");
    session.set_text_position(Point::new(80.0, 60.0));

    let frame = session.composite().unwrap().unwrap();
    assert_eq!(
        frame.pixel(80, 60),
        Some(Rgba8Premul {
            r: 0,
            g: 200,
            b: 0,
            a: 255
        })
    );
}
