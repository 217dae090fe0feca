use std::io::Cursor;

use fadedeck::{Texture, TransitionStyle, compose_into, decode_texture, fit_plane};

fn checker_png(w: u32, h: u32, a: [u8; 3], b: [u8; 3]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        let c = if (x + y) % 2 == 0 { a } else { b };
        image::Rgba([c[0], c[1], c[2], 255])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn textures() -> (Texture, Texture) {
    let a = decode_texture(&checker_png(8, 8, [220, 40, 40], [40, 40, 220])).unwrap();
    let b = decode_texture(&checker_png(8, 8, [30, 200, 90], [250, 250, 250])).unwrap();
    (a, b)
}

#[test]
fn endpoints_reproduce_inputs_for_every_style() {
    let (a, b) = textures();
    let styles = [
        TransitionStyle::Displace { strength: 0.1 },
        TransitionStyle::Displace { strength: 1.5 },
        TransitionStyle::Crossfade,
        TransitionStyle::Zoom,
    ];
    let mut out = vec![0u8; 8 * 8 * 4];
    for style in &styles {
        compose_into(&mut out, 8, 8, &a, &b, 0.0, style).unwrap();
        assert_eq!(out.as_slice(), a.rgba8_premul.as_slice(), "{style:?} at 0");
        compose_into(&mut out, 8, 8, &a, &b, 1.0, style).unwrap();
        assert_eq!(out.as_slice(), b.rgba8_premul.as_slice(), "{style:?} at 1");
    }
}

#[test]
fn zero_strength_displace_matches_crossfade_buffers() {
    let (a, b) = textures();
    let mut displaced = vec![0u8; 8 * 8 * 4];
    let mut faded = vec![0u8; 8 * 8 * 4];
    for t in [0.2, 0.5, 0.8] {
        compose_into(&mut displaced, 8, 8, &a, &b, t, &TransitionStyle::Displace { strength: 0.0 })
            .unwrap();
        compose_into(&mut faded, 8, 8, &a, &b, t, &TransitionStyle::Crossfade).unwrap();
        assert_eq!(displaced, faded, "t={t}");
    }
}

#[test]
fn out_of_range_progress_is_clamped() {
    let (a, b) = textures();
    let mut out = vec![0u8; 8 * 8 * 4];
    compose_into(&mut out, 8, 8, &a, &b, -3.0, &TransitionStyle::Crossfade).unwrap();
    assert_eq!(out.as_slice(), a.rgba8_premul.as_slice());
    compose_into(&mut out, 8, 8, &a, &b, 7.0, &TransitionStyle::Crossfade).unwrap();
    assert_eq!(out.as_slice(), b.rgba8_premul.as_slice());
}

#[test]
fn output_resolution_is_independent_of_texture_size() {
    let (a, b) = textures();
    let mut out = vec![0u8; 16 * 6 * 4];
    compose_into(&mut out, 16, 6, &a, &b, 0.5, &TransitionStyle::Displace { strength: 0.1 })
        .unwrap();
    // Every channel stays a sensible blend of the two inputs.
    assert!(out.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn fit_plane_preserves_aspect_inside_scaled_box() {
    let p = fit_plane(1920, 1080, 1280, 720, 0.35).unwrap();
    // Same aspect as the viewport: both dimensions hit the scaled bound.
    assert!((p.width - 0.7).abs() < 1e-9);
    assert!((p.height - 0.7).abs() < 1e-9);

    let p = fit_plane(1000, 1000, 1280, 720, 0.35).unwrap();
    let plane_aspect = (p.width / 2.0 * 1280.0) / (p.height / 2.0 * 720.0);
    assert!((plane_aspect - 1.0).abs() < 1e-9, "aspect preserved on screen");
}
