//! TLB 翻译场景测试

use vm_tlb::{
    AddressSpace, CacheEntry, CacheOutcome, SoftMmu, TlbConfig, TlbError, TranslationCache,
};

fn four_page_space() -> AddressSpace {
    AddressSpace::from_mappings(1 << 20, [(0, 10), (1, 11), (2, 12), (3, 13)]).unwrap()
}

#[test]
fn test_first_translation_misses_then_hits() {
    let config = TlbConfig {
        capacity: 5,
        page_size: 4096,
        ..Default::default()
    };
    let mut mmu = SoftMmu::from_config(&config).unwrap();

    let first = mmu.translate(0).unwrap();
    assert_eq!(first.outcome, CacheOutcome::Miss { evicted: None });
    assert_eq!(first.frame_number, 0x12345);
    assert_eq!(first.offset, 0);

    let second = mmu.translate(0).unwrap();
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(second.frame_number, 0x12345);
}

#[test]
fn test_capacity_two_evicts_oldest() {
    let space = four_page_space();
    let mut tlb = TranslationCache::new(2).unwrap();

    let (frame, outcome) = tlb.translate(0, &space).unwrap();
    assert_eq!((frame, outcome), (10, CacheOutcome::Miss { evicted: None }));
    let (frame, outcome) = tlb.translate(1, &space).unwrap();
    assert_eq!((frame, outcome), (11, CacheOutcome::Miss { evicted: None }));

    let (frame, outcome) = tlb.translate(2, &space).unwrap();
    assert_eq!(frame, 12);
    assert_eq!(
        outcome,
        CacheOutcome::Miss {
            evicted: Some(CacheEntry {
                virtual_page: 0,
                frame_number: 10
            })
        }
    );

    assert_eq!(tlb.lookup(0), None);
    assert_eq!(tlb.lookup(2), Some(12));
}

#[test]
fn test_unmapped_page_is_invalid_and_not_cached() {
    let space = four_page_space();
    let mut tlb = TranslationCache::new(2).unwrap();
    tlb.translate(3, &space).unwrap();
    let before = tlb.entries().to_vec();

    assert_eq!(tlb.translate(42, &space), Err(TlbError::InvalidPage { page: 42 }));
    assert_eq!(tlb.entries(), before.as_slice());
    assert_eq!(tlb.lookup(42), None);
}

#[test]
fn test_unmapped_address_through_mmu() {
    let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
    let err = mmu.translate(5 * 4096 + 7).unwrap_err();
    assert_eq!(err, TlbError::InvalidPage { page: 5 });
    assert!(!err.is_config_error());
    assert!(mmu.cache().is_empty());

    // 会话继续
    assert!(mmu.translate(1).is_ok());
}

#[test]
fn test_addresses_in_same_page_share_entry() {
    let mut mmu = SoftMmu::from_config(&TlbConfig::default()).unwrap();
    assert!(!mmu.translate(0x000).unwrap().outcome.is_hit());
    let record = mmu.translate(0xFFF).unwrap();
    assert!(record.outcome.is_hit());
    assert_eq!(record.physical_address, 0x1234_5FFF);
    assert_eq!(mmu.cache().len(), 1);
}

#[test]
fn test_lookups_between_inserts_do_not_change_victim() {
    let space = four_page_space();
    let mut tlb = TranslationCache::new(3).unwrap();
    tlb.translate(0, &space).unwrap();
    tlb.translate(1, &space).unwrap();
    tlb.translate(2, &space).unwrap();

    // 命中页 0 多次，FIFO 仍然替换页 0
    for _ in 0..10 {
        assert!(tlb.translate(0, &space).unwrap().1.is_hit());
    }
    let (_, outcome) = tlb.translate(3, &space).unwrap();
    assert_eq!(outcome.evicted().map(|e| e.virtual_page), Some(0));
}

#[test]
fn test_config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("vm-tlb-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tlb.toml");
    std::fs::write(
        &path,
        "capacity = 2\npage_size = 256\naddress_bits = 16\n\n[[mappings]]\npage = 1\nframe = 0x7\n",
    )
    .unwrap();

    let config = TlbConfig::from_file(&path).unwrap();
    let mut mmu = SoftMmu::from_config(&config).unwrap();
    let record = mmu.translate(0x1AB).unwrap();
    assert_eq!(record.virtual_page, 1);
    assert_eq!(record.offset, 0xAB);
    assert_eq!(record.physical_address, 0x7AB);

    let json_path = dir.join("tlb.json");
    std::fs::write(&json_path, config.to_json().unwrap()).unwrap();
    assert_eq!(TlbConfig::from_file(&json_path).unwrap(), config);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../../config/tlb.toml");
    let config = TlbConfig::from_file(path).unwrap();
    assert_eq!(config.capacity, 5);

    let mut mmu = SoftMmu::from_config(&config).unwrap();
    assert_eq!(mmu.translate(0x1004).unwrap().physical_address, 0x42004);
    assert_eq!(mmu.translate(0x2000), Err(TlbError::InvalidPage { page: 2 }));
}
