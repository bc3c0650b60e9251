#![no_main]
use kfk_monitor::protocol::consumer::MemberSubscription;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    MemberSubscription::decode(data).ok();
});
