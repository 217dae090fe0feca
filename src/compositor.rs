use crate::{
    assets::Texture,
    error::{FadedeckError, FadedeckResult},
};

/// Straight-alpha color in normalized [0,1] channels.
pub type Rgba = [f32; 4];

/// Visual skin applied to the primary transition. `Displace` is the
/// canonical algorithm; the others are simple masks kept for variety.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionStyle {
    Displace { strength: f32 },
    Crossfade,
    Wipe,
    Circle,
    Zoom,
}

impl Default for TransitionStyle {
    fn default() -> Self {
        Self::Displace { strength: 0.1 }
    }
}

pub fn parse_style(kind: &str, params: &serde_json::Value) -> FadedeckResult<TransitionStyle> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(FadedeckError::validation("transition kind must be non-empty"));
    }

    match kind.as_str() {
        "displace" | "displacement" => {
            let params = if params.is_null() {
                None
            } else {
                Some(params.as_object().ok_or_else(|| {
                    FadedeckError::validation("displace params must be an object")
                })?)
            };
            let strength = match params.and_then(|p| p.get("strength")).and_then(|v| v.as_f64()) {
                None => 0.1,
                Some(v) => {
                    let f = v as f32;
                    if !f.is_finite() {
                        return Err(FadedeckError::validation(
                            "displace.strength must be finite when set",
                        ));
                    }
                    f.max(0.0)
                }
            };
            Ok(TransitionStyle::Displace { strength })
        }
        "crossfade" | "fade" => Ok(TransitionStyle::Crossfade),
        "wipe" => Ok(TransitionStyle::Wipe),
        "circle" => Ok(TransitionStyle::Circle),
        "zoom" => Ok(TransitionStyle::Zoom),
        _ => Err(FadedeckError::validation(format!(
            "unknown transition kind '{kind}'"
        ))),
    }
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn mix_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        mix(a[0], b[0], t),
        mix(a[1], b[1], t),
        mix(a[2], b[2], t),
        mix(a[3], b[3], t),
    ]
}

fn texel(tex: &Texture, x: u32, y: u32) -> Rgba {
    let x = x.min(tex.width - 1);
    let y = y.min(tex.height - 1);
    let i = ((y as usize * tex.width as usize) + x as usize) * 4;
    let px = &tex.rgba8_premul[i..i + 4];
    [
        f32::from(px[0]) / 255.0,
        f32::from(px[1]) / 255.0,
        f32::from(px[2]) / 255.0,
        f32::from(px[3]) / 255.0,
    ]
}

/// Bilinear sample at normalized (u, v), clamp-to-edge. Sampling exactly at
/// a pixel center reproduces that texel, which is what makes the progress
/// 0/1 identities byte-exact.
pub fn sample(tex: &Texture, u: f32, v: f32) -> Rgba {
    let x = u.clamp(0.0, 1.0) * tex.width as f32 - 0.5;
    let y = v.clamp(0.0, 1.0) * tex.height as f32 - 0.5;

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    // Clamp each tap independently so a sample past the border collapses
    // both taps onto the edge texel instead of bleeding one column inward.
    let max_x = (tex.width - 1) as f32;
    let max_y = (tex.height - 1) as f32;
    let x0i = x0.clamp(0.0, max_x) as u32;
    let x1i = (x0 + 1.0).clamp(0.0, max_x) as u32;
    let y0i = y0.clamp(0.0, max_y) as u32;
    let y1i = (y0 + 1.0).clamp(0.0, max_y) as u32;

    let top = mix_rgba(texel(tex, x0i, y0i), texel(tex, x1i, y0i), fx);
    let bot = mix_rgba(texel(tex, x0i, y1i), texel(tex, x1i, y1i), fx);
    mix_rgba(top, bot, fy)
}

/// Canonical displacement blend at surface coordinate (u, v).
///
/// Per-image pseudo-gradients are built from the color channels
/// (`((c.rg + c.b) * 0.5) * 2 - 1`), averaged, scaled by `strength`, and
/// used to displace the sampling points of both images in opposite
/// directions weighted by progress. progress=0 reproduces `from` exactly,
/// progress=1 reproduces `to` exactly, strength=0 degenerates to a plain
/// linear cross-fade.
pub fn displace_blend(
    from: &Texture,
    to: &Texture,
    u: f32,
    v: f32,
    progress: f32,
    strength: f32,
) -> Rgba {
    let ca = sample(from, u, v);
    let cb = sample(to, u, v);

    let oa = [
        ((ca[0] + ca[2]) * 0.5) * 2.0 - 1.0,
        ((ca[1] + ca[2]) * 0.5) * 2.0 - 1.0,
    ];
    let ob = [
        ((cb[0] + cb[2]) * 0.5) * 2.0 - 1.0,
        ((cb[1] + cb[2]) * 0.5) * 2.0 - 1.0,
    ];
    let oc = [
        mix(oa[0], ob[0], 0.5) * strength,
        mix(oa[1], ob[1], 0.5) * strength,
    ];

    let w0 = progress;
    let w1 = 1.0 - progress;
    let a = sample(from, u + oc[0] * w0, v + oc[1] * w0);
    let b = sample(to, u - oc[0] * w1, v - oc[1] * w1);
    mix_rgba(a, b, progress)
}

/// Blend one output pixel under the given style.
pub fn blend_at(
    style: &TransitionStyle,
    from: &Texture,
    to: &Texture,
    u: f32,
    v: f32,
    progress: f32,
) -> Rgba {
    let t = progress.clamp(0.0, 1.0);
    match style {
        TransitionStyle::Displace { strength } => displace_blend(from, to, u, v, t, *strength),
        TransitionStyle::Crossfade => mix_rgba(sample(from, u, v), sample(to, u, v), t),
        TransitionStyle::Wipe => {
            let mask = if t >= u { 1.0 } else { 0.0 };
            mix_rgba(sample(from, u, v), sample(to, u, v), mask)
        }
        TransitionStyle::Circle => {
            let dist = ((u - 0.5).powi(2) + (v - 0.5).powi(2)).sqrt();
            let mask = if t * 0.7 >= dist { 1.0 } else { 0.0 };
            mix_rgba(sample(from, u, v), sample(to, u, v), mask)
        }
        TransitionStyle::Zoom => {
            let ku = 1.0 - t * 0.5;
            let from_uv = [mix(0.5, u, ku), mix(0.5, v, ku)];
            let kn = 0.5 - t * 0.5;
            let to_uv = [mix(u, 0.5, kn), mix(v, 0.5, kn)];
            mix_rgba(
                sample(from, from_uv[0], from_uv[1]),
                sample(to, to_uv[0], to_uv[1]),
                t,
            )
        }
    }
}

/// Compose a full transition frame into an RGBA8 buffer of `width`×`height`.
pub fn compose_into(
    dst: &mut [u8],
    width: u32,
    height: u32,
    from: &Texture,
    to: &Texture,
    progress: f32,
    style: &TransitionStyle,
) -> FadedeckResult<()> {
    if dst.len() != (width as usize) * (height as usize) * 4 {
        return Err(FadedeckError::validation(
            "compose_into expects a width*height*4 rgba8 buffer",
        ));
    }
    let t = progress.clamp(0.0, 1.0);

    for y in 0..height {
        let v = (y as f32 + 0.5) / height as f32;
        for x in 0..width {
            let u = (x as f32 + 0.5) / width as f32;
            let c = blend_at(style, from, to, u, v, t);
            let i = ((y as usize * width as usize) + x as usize) * 4;
            for ch in 0..4 {
                dst[i + ch] = (c[ch].clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }
    Ok(())
}

/// Aspect-correct presentation size of the image plane, in NDC units where
/// the full viewport spans 2×2. Recomputed on viewport resize and on every
/// destination-slide change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneSize {
    pub width: f64,
    pub height: f64,
}

pub fn fit_plane(
    image_w: u32,
    image_h: u32,
    viewport_w: u32,
    viewport_h: u32,
    image_scale: f64,
) -> FadedeckResult<PlaneSize> {
    if image_w == 0 || image_h == 0 || viewport_w == 0 || viewport_h == 0 {
        return Err(FadedeckError::validation(
            "fit_plane requires non-zero image and viewport dimensions",
        ));
    }
    let image_aspect = f64::from(image_w) / f64::from(image_h);
    let screen_aspect = f64::from(viewport_w) / f64::from(viewport_h);

    let (width, height) = if image_aspect > screen_aspect {
        (
            2.0 * image_scale,
            (2.0 / image_aspect) * screen_aspect * image_scale,
        )
    } else {
        (
            2.0 * image_aspect / screen_aspect * image_scale,
            2.0 * image_scale,
        )
    };
    Ok(PlaneSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex(w: u32, h: u32, pixels: &[[u8; 4]]) -> Texture {
        let mut buf = Vec::with_capacity(pixels.len() * 4);
        for p in pixels {
            buf.extend_from_slice(p);
        }
        Texture::from_rgba8(w, h, buf).unwrap()
    }

    fn gradient(w: u32, h: u32, seed: u8) -> Texture {
        let mut pixels = Vec::new();
        for y in 0..h {
            for x in 0..w {
                pixels.push([
                    (x * 37 + seed as u32) as u8,
                    (y * 53) as u8,
                    (x * 11 + y * 7) as u8,
                    255,
                ]);
            }
        }
        tex(w, h, &pixels)
    }

    #[test]
    fn parse_style_aliases_and_params() {
        assert_eq!(
            parse_style("fade", &serde_json::Value::Null).unwrap(),
            TransitionStyle::Crossfade
        );
        assert_eq!(
            parse_style("Displacement", &serde_json::json!({ "strength": 0.25 })).unwrap(),
            TransitionStyle::Displace { strength: 0.25 }
        );
        assert_eq!(
            parse_style("displace", &serde_json::json!({ "strength": -1.0 })).unwrap(),
            TransitionStyle::Displace { strength: 0.0 }
        );
        assert!(parse_style("melt", &serde_json::Value::Null).is_err());
        assert!(parse_style("", &serde_json::Value::Null).is_err());
    }

    #[test]
    fn bilinear_sampling_clamps_to_edge_texels() {
        // Sampling past the first pixel center must collapse both taps onto
        // the border texel, not mix it with the next column or row.
        let row = tex(2, 1, &[[0, 0, 0, 255], [255, 255, 255, 255]]);
        assert_eq!(sample(&row, 0.0, 0.5), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(sample(&row, 1.0, 0.5), [1.0, 1.0, 1.0, 1.0]);

        let col = tex(1, 2, &[[0, 0, 0, 255], [255, 255, 255, 255]]);
        assert_eq!(sample(&col, 0.5, 0.0), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(sample(&col, 0.5, 1.0), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn progress_zero_reproduces_from_exactly() {
        let a = gradient(4, 4, 10);
        let b = gradient(4, 4, 200);
        let mut out = vec![0u8; 4 * 4 * 4];
        for strength in [0.0, 0.1, 2.0] {
            compose_into(&mut out, 4, 4, &a, &b, 0.0, &TransitionStyle::Displace { strength })
                .unwrap();
            assert_eq!(out.as_slice(), a.rgba8_premul.as_slice(), "strength {strength}");
        }
    }

    #[test]
    fn progress_one_reproduces_to_exactly() {
        let a = gradient(4, 4, 10);
        let b = gradient(4, 4, 200);
        let mut out = vec![0u8; 4 * 4 * 4];
        for strength in [0.0, 0.1, 2.0] {
            compose_into(&mut out, 4, 4, &a, &b, 1.0, &TransitionStyle::Displace { strength })
                .unwrap();
            assert_eq!(out.as_slice(), b.rgba8_premul.as_slice(), "strength {strength}");
        }
    }

    #[test]
    fn zero_strength_is_plain_crossfade() {
        let a = gradient(3, 3, 0);
        let b = gradient(3, 3, 90);
        for (u, v) in [(0.2, 0.4), (0.5, 0.5), (0.9, 0.1)] {
            for t in [0.25, 0.5, 0.75] {
                let got = displace_blend(&a, &b, u, v, t, 0.0);
                let want = mix_rgba(sample(&a, u, v), sample(&b, u, v), t);
                for ch in 0..4 {
                    assert!((got[ch] - want[ch]).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn wipe_mask_switches_at_progress() {
        let a = tex(1, 1, &[[255, 0, 0, 255]]);
        let b = tex(1, 1, &[[0, 255, 0, 255]]);
        let left = blend_at(&TransitionStyle::Wipe, &a, &b, 0.25, 0.5, 0.5);
        let right = blend_at(&TransitionStyle::Wipe, &a, &b, 0.75, 0.5, 0.5);
        assert_eq!(left[1], 1.0, "left of the wipe edge shows the new image");
        assert_eq!(right[0], 1.0, "right of the wipe edge keeps the old image");
    }

    #[test]
    fn compose_into_rejects_wrong_buffer_size() {
        let a = gradient(2, 2, 0);
        let b = gradient(2, 2, 1);
        let mut out = vec![0u8; 7];
        assert!(compose_into(&mut out, 2, 2, &a, &b, 0.5, &TransitionStyle::Crossfade).is_err());
    }

    #[test]
    fn fit_plane_letterboxes_by_aspect() {
        // Wide image on a square viewport: width capped, height reduced.
        let p = fit_plane(200, 100, 100, 100, 0.35).unwrap();
        assert!((p.width - 0.7).abs() < 1e-12);
        assert!((p.height - 0.35).abs() < 1e-12);

        // Tall image on a wide viewport: height capped, width reduced.
        let p = fit_plane(100, 200, 200, 100, 0.35).unwrap();
        assert!((p.height - 0.7).abs() < 1e-12);
        assert!((p.width - 0.175).abs() < 1e-12);

        assert!(fit_plane(0, 1, 1, 1, 0.35).is_err());
    }
}
