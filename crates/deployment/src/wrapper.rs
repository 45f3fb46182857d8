use engine::RecordedResource;
use stack_core::PropertyMap;

/// Split the internal root wrapper out of a recorded resource list.
///
/// Returns the remaining resources in registration order, plus the
/// wrapper's outputs if a wrapper was recorded.
pub fn unwrap_stack_wrapper(
    resources: Vec<RecordedResource>,
) -> (Vec<RecordedResource>, Option<PropertyMap>) {
    let mut outputs = None;
    let mut kept = Vec::with_capacity(resources.len());

    for resource in resources {
        if resource.is_stack_wrapper() {
            outputs = Some(resource.outputs);
        } else {
            kept.push(resource);
        }
    }

    (kept, outputs)
}
