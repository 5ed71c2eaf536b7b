use anyhow::{Context, Result};
use smithay_client_toolkit::{
    compositor::{CompositorHandler, CompositorState},
    delegate_compositor, delegate_keyboard, delegate_output, delegate_pointer, delegate_registry,
    delegate_seat, delegate_shm, delegate_layer, registry_handlers,
    output::{OutputHandler, OutputState},
    registry::{ProvidesRegistryState, RegistryState},
    seat::{
        keyboard::{KeyEvent, KeyboardHandler, Modifiers},
        pointer::{PointerEvent, PointerEventKind, PointerHandler, BTN_LEFT},
        Capability, SeatHandler, SeatState,
    },
    shell::{
        wlr_layer::{
            LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
        },
        WaylandSurface,
    },
    shm::{slot::SlotPool, Shm, ShmHandler},
};
use wayland_client::{
    globals::GlobalList,
    protocol::{
        wl_keyboard::WlKeyboard,
        wl_output::{Transform, WlOutput},
        wl_pointer::WlPointer,
        wl_seat::WlSeat,
        wl_shm,
        wl_surface::WlSurface,
    },
    Connection, QueueHandle,
};
use xkbcommon::xkb::{keysyms, Keysym};
use log::{debug, error};
use crate::executor;
use crate::state::AppState;
use crate::ui::layout::GridLayout;
use crate::ui::render::Renderer;

pub struct WaylandApp {
    pub registry_state: RegistryState,
    pub seat_state: SeatState,
    pub output_state: OutputState,
    pub compositor_state: CompositorState,
    pub shm_state: Shm,
    pub layer_shell_state: LayerShell,

    pub layer_surface: Option<LayerSurface>,
    pub pool: Option<SlotPool>,
    pub keyboard: Option<WlKeyboard>,
    pub pointer: Option<WlPointer>,
    pub width: u32,
    pub height: u32,
    pub should_exit: bool,

    pub state: AppState,
    pub renderer: Renderer,
}

impl WaylandApp {
    pub fn new(globals: &GlobalList, qh: &QueueHandle<Self>, state: AppState, renderer: Renderer) -> Result<Self> {
        let registry_state = RegistryState::new(globals);
        let seat_state = SeatState::new(globals, qh);
        let output_state = OutputState::new(globals, qh);
        let compositor_state = CompositorState::bind(globals, qh).context("wl_compositor not available")?;
        let shm_state = Shm::bind(globals, qh).context("wl_shm not available")?;
        let layer_shell_state = LayerShell::bind(globals, qh).context("zwlr_layer_shell_v1 not available")?;
        let (width, height) = (state.config.theme.width, state.config.theme.height);

        Ok(Self {
            registry_state,
            seat_state,
            output_state,
            compositor_state,
            shm_state,
            layer_shell_state,
            layer_surface: None,
            pool: None,
            keyboard: None,
            pointer: None,
            width,
            height,
            should_exit: false,
            state,
            renderer,
        })
    }

    pub fn draw(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>) {
        let Some(layer_surface) = &self.layer_surface else { return; };
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 { return; }

        let Some(pool) = self.pool.as_mut() else { return; };

        let (buffer, canvas) = match pool.create_buffer(
            width as i32,
            height as i32,
            (width * 4) as i32,
            wl_shm::Format::Argb8888,
        ) {
            Ok(created) => created,
            Err(err) => {
                error!("Failed to create shm buffer: {}", err);
                return;
            }
        };

        if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(canvas, width, height) {
            self.renderer.draw(&mut pixmap, &self.state);

            // RGBA -> ARGB8888 (little endian BGRA)
            for chunk in canvas.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }

            let surface = layer_surface.wl_surface();
            surface.attach(Some(buffer.wl_buffer()), 0, 0);
            surface.damage_buffer(0, 0, width as i32, height as i32);
            surface.commit();
        }
    }

    fn grid(&self) -> GridLayout {
        GridLayout::new(self.width, self.height, &self.state.config.theme)
    }

    /// Launches the tile at `position` in the filtered list and closes the launcher.
    fn activate(&mut self, position: usize) {
        if let Some(entry) = self.state.visible_entry(position) {
            executor::launch(entry, &self.state.config);
            self.should_exit = true;
        }
    }

    fn request_redraw(&self, qh: &QueueHandle<Self>) {
        if let Some(layer_surface) = &self.layer_surface {
            let surface = layer_surface.wl_surface();
            surface.frame(qh, surface.clone());
            surface.commit();
        }
    }
}

impl LayerShellHandler for WaylandApp {
    fn closed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &LayerSurface) {
        self.should_exit = true;
    }

    fn configure(&mut self, conn: &Connection, qh: &QueueHandle<Self>, _: &LayerSurface, configure: LayerSurfaceConfigure, _: u32) {
        let (width, height) = configure.new_size;
        if width > 0 {
            self.width = width;
        }
        if height > 0 {
            self.height = height;
        }

        let needed = self.width as usize * self.height as usize * 4;
        if self.pool.is_none() {
            match SlotPool::new(needed, &self.shm_state) {
                Ok(pool) => self.pool = Some(pool),
                Err(err) => {
                    error!("Failed to create shm pool: {}", err);
                    self.should_exit = true;
                    return;
                }
            }
        }
        if let Some(pool) = &mut self.pool {
            if pool.len() < needed {
                if let Err(err) = pool.resize(needed) {
                    error!("Failed to resize shm pool: {}", err);
                }
            }
        }

        self.draw(conn, qh);
    }
}

// Drawn at scale 1 on whatever output the compositor picks.
impl CompositorHandler for WaylandApp {
    fn frame(&mut self, conn: &Connection, qh: &QueueHandle<Self>, _: &WlSurface, _: u32) {
        self.draw(conn, qh);
    }

    fn scale_factor_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlSurface, _: i32) {}
    fn transform_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlSurface, _: Transform) {}
    fn surface_enter(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlSurface, _: &WlOutput) {}
    fn surface_leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlSurface, _: &WlOutput) {}
}

impl OutputHandler for WaylandApp {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlOutput) {}
    fn update_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlOutput) {}
    fn output_destroyed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlOutput) {}
}

impl SeatHandler for WaylandApp {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlSeat) {}

    fn new_capability(&mut self, _: &Connection, qh: &QueueHandle<Self>, seat: WlSeat, capability: Capability) {
        if capability == Capability::Keyboard && self.keyboard.is_none() {
            match self.seat_state.get_keyboard(qh, &seat, None) {
                Ok(keyboard) => self.keyboard = Some(keyboard),
                Err(err) => error!("Failed to get keyboard: {}", err),
            }
        }
        if capability == Capability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(err) => error!("Failed to get pointer: {}", err),
            }
        }
    }

    fn remove_capability(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlSeat, capability: Capability) {
        if capability == Capability::Keyboard {
            if let Some(keyboard) = self.keyboard.take() {
                keyboard.release();
            }
        }
        if capability == Capability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }

    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: WlSeat) {}
}

impl KeyboardHandler for WaylandApp {
    fn enter(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlKeyboard, _: &WlSurface, _: u32, _: &[u32], _: &[Keysym]) {}

    fn leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlKeyboard, _: &WlSurface, _: u32) {
        if self.state.config.general.close_on_focus_loss {
            debug!("Keyboard focus lost, closing");
            self.should_exit = true;
        }
    }

    fn press_key(&mut self, _: &Connection, qh: &QueueHandle<Self>, _: &WlKeyboard, _: u32, event: KeyEvent) {
        match u32::from(event.keysym) {
            keysyms::KEY_Escape => self.should_exit = true,
            keysyms::KEY_Return | keysyms::KEY_KP_Enter => self.activate(self.state.selected_index),
            keysyms::KEY_Left => self.state.move_selection(-1),
            keysyms::KEY_Right | keysyms::KEY_Tab => self.state.move_selection(1),
            keysyms::KEY_Up => self.state.move_rows(-1),
            keysyms::KEY_Down => self.state.move_rows(1),
            keysyms::KEY_BackSpace => self.state.pop_char(),
            _ => {
                if let Some(utf8) = event.utf8 {
                    if !utf8.chars().any(|c| c.is_control()) {
                        self.state.push_str(&utf8);
                    }
                }
            }
        }

        self.request_redraw(qh);
    }

    fn release_key(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlKeyboard, _: u32, _: KeyEvent) {}

    fn update_modifiers(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &WlKeyboard, _: u32, _: Modifiers, _: u32) {}
}

impl PointerHandler for WaylandApp {
    fn pointer_frame(&mut self, _: &Connection, qh: &QueueHandle<Self>, _: &WlPointer, events: &[PointerEvent]) {
        let grid = self.grid();

        for event in events {
            match event.kind {
                PointerEventKind::Press { button, .. } if button == BTN_LEFT => {
                    let (x, y) = event.position;
                    let scroll_row = grid.scroll_row(self.state.selected_index);
                    if let Some(position) = grid.hit_test(x, y, scroll_row) {
                        if self.state.select(position) {
                            self.activate(position);
                        }
                    }
                }
                PointerEventKind::Axis { vertical, .. } => {
                    if vertical.absolute > 0.0 {
                        self.state.move_rows(1);
                    } else if vertical.absolute < 0.0 {
                        self.state.move_rows(-1);
                    }
                }
                _ => {}
            }
        }

        self.request_redraw(qh);
    }
}

impl ShmHandler for WaylandApp {
    fn shm_state(&mut self) -> &mut Shm {
        &mut self.shm_state
    }
}

delegate_compositor!(WaylandApp);
delegate_output!(WaylandApp);
delegate_shm!(WaylandApp);
delegate_seat!(WaylandApp);
delegate_keyboard!(WaylandApp);
delegate_pointer!(WaylandApp);
delegate_layer!(WaylandApp);
delegate_registry!(WaylandApp);

impl ProvidesRegistryState for WaylandApp {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }

    // Outputs and seats that appear after startup are tracked too.
    registry_handlers![OutputState, SeatState];
}
