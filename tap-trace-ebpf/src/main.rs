#![no_std]
#![no_main]

pub use open_monitor::*;
pub use source_printer::*;

mod open_monitor;
mod source_printer;

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
