#[cfg(target_os = "espidf")]
mod device {
    use std::sync::mpsc;
    use std::time::Instant;

    use anyhow::Context;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;

    use nobu_face::app::Face;
    use nobu_face::asset::DirStore;
    use nobu_face::board::display;
    use nobu_face::board::sdcard;
    use nobu_face::config::Config;
    use nobu_face::connectivity::{Connectivity, LinkStatus};
    use nobu_face::face::Renderer;
    use nobu_face::wifi::EspLink;
    use nobu_face::ws::EspSession;

    /// Main loop period
    const LOOP_DELAY_MS: u32 = 10;

    // https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
    pub fn run() -> anyhow::Result<()> {
        // It is necessary to call this function once. Otherwise some patches to the runtime
        // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
        esp_idf_svc::sys::link_patches();

        // Bind the log crate to the ESP Logging facilities
        esp_idf_svc::log::EspLogger::initialize_default();

        let config = Config::default();
        let peripherals = Peripherals::take().context("Could not take peripherals")?;
        let pins = peripherals.pins;

        let mut display = display::open(
            peripherals.spi3,
            pins.gpio18,
            pins.gpio23,
            pins.gpio5,
            pins.gpio4,
            pins.gpio17,
            pins.gpio16,
        )
        .context("Could not bring up the display")?;

        let mut renderer = Renderer::new(config.face);
        // The card has to stay mounted while the renderer reads from it
        let _sd_card = match sdcard::mount(
            peripherals.spi2,
            pins.gpio13,
            pins.gpio15,
            pins.gpio26,
            pins.gpio2,
        ) {
            Ok(card) => {
                renderer = renderer.with_store(DirStore::new(sdcard::FACES_DIR));
                Some(card)
            }
            Err(e) => {
                log::warn!("SD card init failed, using programmatic faces: {:?}", e);
                None
            }
        };

        let mut face = Face::new(config.demo, Instant::now());
        renderer.render(&mut display, &face.current());

        let link = EspLink::new(peripherals.modem).context("Could not start WiFi")?;
        let mut connectivity = Connectivity::new(link, EspSession::new(), &config);

        let (commands_tx, commands_rx) = mpsc::channel();
        connectivity.set_dispatch(move |command| {
            if commands_tx.send(command).is_err() {
                log::warn!("Command queue closed");
            }
        });

        let mut link_was_up = false;
        loop {
            let now = Instant::now();
            connectivity.tick(now);

            let link_up = connectivity.link_status() == LinkStatus::Up;
            if link_up && !link_was_up {
                match connectivity.link().get_ip_info() {
                    Ok(ip_info) => log::info!("IP: {}", ip_info.ip),
                    Err(e) => log::warn!("No IP info: {:?}", e),
                }
            }
            link_was_up = link_up;

            for command in commands_rx.try_iter() {
                if let Some(request) = face.apply(command) {
                    renderer.render(&mut display, &request);
                }
            }

            if let Some(request) = face.demo_step(now, connectivity.is_session_open()) {
                renderer.render(&mut display, &request);
            }

            FreeRtos::delay_ms(LOOP_DELAY_MS);
        }
    }
}

/// Off the device the binary prints every procedural face as text
#[cfg(not(target_os = "espidf"))]
mod preview {
    use nobu_face::config::Config;
    use nobu_face::face::{Expression, RenderRequest, Renderer};
    use nobu_face::surface::FrameBuffer;

    pub fn run() -> anyhow::Result<()> {
        let config = Config::default();
        let renderer = Renderer::new(config.face);

        for expression in Expression::ALL {
            let mut frame = FrameBuffer::new(config.face.width, config.face.height);
            renderer.render(&mut frame, &RenderRequest::new(expression.name()));
            println!("== {} ==", expression);
            println!("{}", frame.to_ascii());
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    #[cfg(target_os = "espidf")]
    return device::run();

    #[cfg(not(target_os = "espidf"))]
    return preview::run();
}
