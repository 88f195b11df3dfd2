/*!
# Index Buffer - Soft Device Backend

CPU implementation of the `index_buffer` graphics device.

The soft device keeps buffer storage in process memory and follows the same
bind-then-operate model as hardware drivers: GL-style buffer names, one
buffer per binding target, mapping and device-side copies. Device profiles
reproduce the capability sets of the device families index buffers run on,
so every code path (direct copy, mapped fallback, unsupported) can be
exercised without a GPU.

## Example

```no_run
use index_buffer::{DeviceContext, IndexBuffer};
use index_buffer_device_soft::{DeviceProfile, SoftDevice};

let device = SoftDevice::with_profile(DeviceProfile::Embedded);
let context = DeviceContext::new(device.clone());

let mut indices = IndexBuffer::new(&context);
indices.create(3)?;
indices.update(&[0, 1, 2])?;
IndexBuffer::bind(&context, Some(&indices));

assert_eq!(device.draw_indexed(3)?, vec![0, 1, 2]);
# Ok::<(), index_buffer::Error>(())
```
*/

mod name_allocator;
mod soft_device;
mod stats;

pub use soft_device::{DeviceProfile, SoftDevice, SoftDeviceConfig};
pub use stats::{print_stats_report, DeviceStats};
