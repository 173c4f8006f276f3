use serde_json::json;
use tomo_host::{shape_of, DevicePtr, GpuLink, Shape};

#[test]
fn pre_sized_buffer_matches_the_resolved_shape() {
    // Typical flow: resolve the projection-data shape, allocate a device
    // block of that size elsewhere, then describe it with a link.
    let geom = json!({
        "type": "cone",
        "DetectorRowCount": 64,
        "ProjectionAngles": (0..360).map(|i| i as f64).collect::<Vec<_>>(),
        "DetectorColCount": 128,
    });
    let shape = shape_of(&geom).unwrap();
    assert_eq!(shape, Shape::Three(64, 360, 128));

    // x is the fastest-changing axis, so the shape maps onto the link in
    // reverse order.
    let link = GpuLink::contiguous(DevicePtr(0x2000_0000), 128, 360, 64).unwrap();
    assert_eq!(link.element_count(), shape.element_count() as u64);
    assert_eq!(link.size_in_bytes(), 128 * 4 * 360 * 64);
}

#[test]
fn pitched_allocations_carry_their_padding() {
    // cudaMalloc3D commonly pads rows to 512-byte boundaries.
    let link = GpuLink::new(DevicePtr(0x2000_0000), 100, 360, 64, 512).unwrap();
    assert!(!link.is_contiguous());
    assert_eq!(link.element_count(), 100 * 360 * 64);
    assert_eq!(link.size_in_bytes(), 512 * 360 * 64);
}

#[test]
fn links_are_plain_bytes_for_the_registration_boundary() {
    let link = GpuLink::contiguous(DevicePtr(0xABCD), 4, 5, 6).unwrap();
    let bytes = bytemuck::bytes_of(&link);
    assert_eq!(bytes.len(), core::mem::size_of::<GpuLink>());
    let restored: GpuLink = bytemuck::pod_read_unaligned(bytes);
    assert_eq!(restored, link);
}
