use std::num::NonZeroU32;
use std::str::FromStr;

use ethers::utils::to_checksum;
use safe_setup::{Address, ContractRegistryEntry, Period, ScheduleSpec};

pub const MASTER_COPY_ADDRESS: &str = "0xe3d4Af0e46Aa207222bC6FC11652dDF68eBF1d15";
pub const PROXY_FACTORY_ADDRESS: &str = "0x5eAa96A55e703BD410DCdc300683a05951080218";
pub const OTHER_MASTER_COPY_ADDRESS: &str = "0x34CfAC646f301356fAa8B21e94227e3583Fe3F5F";
pub const ANOTHER_MASTER_COPY_ADDRESS: &str = "0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552";

pub fn schedule(name: &str, interval: u32, period: Period) -> ScheduleSpec {
    ScheduleSpec::new(
        name,
        &format!("{name} label"),
        NonZeroU32::new(interval).unwrap(),
        period,
    )
}

pub fn address(address: &str) -> Address {
    Address::from_str(address).unwrap()
}

/// The form addresses are stored and reported in
pub fn checksummed(address_value: &str) -> String {
    to_checksum(&address(address_value), None)
}

pub fn master_copy_entry(
    address_value: &str,
    initial_block_number: u64,
    version: &str,
) -> ContractRegistryEntry {
    ContractRegistryEntry::new(address(address_value), initial_block_number).with_version(version)
}

pub fn proxy_factory_entry(address_value: &str, initial_block_number: u64) -> ContractRegistryEntry {
    ContractRegistryEntry::new(address(address_value), initial_block_number)
}
