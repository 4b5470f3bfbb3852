use candle_core::Device;

/// Metal when the feature is enabled and a GPU is present, otherwise CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("model device: metal");
            return dev;
        }
    }
    tracing::info!("model device: cpu");
    Device::Cpu
}
