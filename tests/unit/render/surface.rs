use super::*;

fn checker_2x2() -> Raster {
    Raster::new(
        2,
        2,
        vec![
            255, 0, 0, 255, /**/ 0, 255, 0, 255, //
            0, 0, 255, 255, /**/ 255, 255, 255, 255,
        ],
    )
    .unwrap()
}

#[test]
fn raster_new_checks_length() {
    assert!(Raster::new(2, 2, vec![0; 15]).is_err());
    let err = Raster::new(4, 4, vec![0; 8]).unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));

    let r = Raster::new(2, 2, vec![7; 16]).unwrap();
    assert_eq!((r.width(), r.height()), (2, 2));
    assert_eq!(r.data().len(), 16);
}

#[test]
fn every_in_bounds_lookup_is_backed_by_data() {
    let r = Raster::solid(4, 3, [10, 20, 30, 255]);
    assert_eq!(r.data().len(), 4 * 3 * 4);
    for y in 0..3 {
        for x in 0..4 {
            assert_eq!(r.pixel(x, y), Some([10, 20, 30, 255]));
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            assert_eq!(r.sample_nearest(p)[3], 1.0);
        }
    }
}

#[test]
fn solid_premultiplies() {
    let r = Raster::solid(3, 1, [200, 100, 50, 128]);
    assert_eq!(r.pixel(2, 0), Some([100, 50, 25, 128]));
    assert_eq!(r.pixel(3, 0), None);
}

#[test]
fn bilinear_hits_texel_centers_exactly() {
    let r = checker_2x2();
    assert_eq!(r.sample_bilinear(Point::new(0.5, 0.5)), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(r.sample_bilinear(Point::new(1.5, 1.5)), [1.0, 1.0, 1.0, 1.0]);
    let mid = r.sample_bilinear(Point::new(1.0, 0.5));
    assert!((mid[0] - 0.5).abs() < 1e-6 && (mid[1] - 0.5).abs() < 1e-6);
}

#[test]
fn sampling_outside_is_transparent() {
    let r = checker_2x2();
    assert_eq!(r.sample_nearest(Point::new(-0.1, 0.5)), TRANSPARENT);
    assert_eq!(r.sample_bilinear(Point::new(10.0, 10.0)), TRANSPARENT);
    // Half a texel past the edge blends with transparent.
    assert!((r.sample_bilinear(Point::new(0.0, 0.5))[3] - 0.5).abs() < 1e-6);
}

#[test]
fn buffer_quantizes_to_frame() {
    let mut buf = PixelBuffer::new(2, 1);
    buf.set(1, 0, [0.5, 1.5, -1.0, 1.0]);
    buf.set(5, 5, [1.0; 4]);
    let frame = buf.to_frame();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(frame.pixel(1, 0), Some([128, 255, 0, 255]));
}

#[test]
fn short_frame_data_reads_as_missing() {
    let frame = Frame {
        width: 2,
        height: 2,
        data: vec![1, 2, 3, 4],
    };
    assert_eq!(frame.pixel(0, 0), Some([1, 2, 3, 4]));
    assert_eq!(frame.pixel(1, 1), None);
}

#[test]
fn png_sequence_names_frames_in_order() {
    let dir = std::path::PathBuf::from("target").join("unit_png_sequence");
    let _ = std::fs::remove_dir_all(&dir);
    let mut seq = PngSequence::new(&dir, "f");
    let frame = PixelBuffer::filled(2, 2, [0.0, 0.0, 1.0, 1.0]).to_frame();
    seq.present(&frame).unwrap();
    seq.present(&frame).unwrap();
    assert_eq!(seq.frames_written(), 2);
    assert!(seq.path_for(1).exists());
    assert!(dir.join("f00001.png").exists());

    let decoded = image::open(seq.path_for(0)).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(1, 1).0, [0, 0, 255, 255]);
}

#[test]
fn unpremultiply_restores_straight_color() {
    assert_eq!(unpremultiply([0.25, 0.5, 0.0, 0.5]), [0.5, 1.0, 0.0, 0.5]);
    assert_eq!(unpremultiply([0.3, 0.3, 0.3, 0.0]), TRANSPARENT);
}
