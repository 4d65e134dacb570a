use dxl_packet::{InstructionPacket, control_table::{self, Item}};

const ID: u8 = 1;

fn main() {
    let packet = InstructionPacket::write(
        ID,
        control_table::GoalPosition::ADDRESS,
        &512_u32.to_le_bytes(),
    )
    .expect("ID 1 is a valid device");
    println!("{:02X?}", packet.encode());
}
