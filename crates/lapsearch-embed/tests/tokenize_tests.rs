mod common;

use candle_core::Device;
use common::{tiny_tokenizer, CLS, PAD, SEP};
use lapsearch_embed::tokenize::{encode_batch, pad_token_id};

#[test]
fn pairs_are_right_padded_with_document_type_ids() {
    let tok = tiny_tokenizer();
    assert_eq!(pad_token_id(&tok), PAD);
    let pairs = vec![("Dell laptop", "Intel GPU RAM"), ("Dell", "RAM")];
    let batch = encode_batch(&tok, pairs, 64, &Device::Cpu).unwrap();

    assert_eq!(batch.input_ids.dims(), &[2, 8]);
    let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
    let mask: Vec<Vec<u32>> = batch.attention_mask.to_vec2().unwrap();
    let types: Vec<Vec<u32>> = batch.token_type_ids.to_vec2().unwrap();

    assert_eq!(ids[0], vec![CLS, 4, 5, SEP, 6, 8, 9, SEP]);
    assert_eq!(mask[0], vec![1; 8]);
    assert_eq!(types[0], vec![0, 0, 0, 0, 1, 1, 1, 1]);

    assert_eq!(ids[1], vec![CLS, 4, SEP, 9, SEP, PAD, PAD, PAD]);
    assert_eq!(mask[1], vec![1, 1, 1, 1, 1, 0, 0, 0]);
    assert_eq!(types[1], vec![0, 0, 0, 1, 1, 0, 0, 0]);
}

#[test]
fn rows_longer_than_max_len_are_truncated() {
    let tok = tiny_tokenizer();
    let batch = encode_batch(&tok, vec![("dell laptop", "intel gpu ram")], 6, &Device::Cpu).unwrap();
    assert_eq!(batch.input_ids.dims(), &[1, 6]);
    let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
    assert_eq!(ids[0], vec![CLS, 4, 5, SEP, 6, 8]);
}

#[test]
fn unknown_words_map_to_unk() {
    let tok = tiny_tokenizer();
    let batch = encode_batch(&tok, vec!["dell thinkpad"], 16, &Device::Cpu).unwrap();
    let ids: Vec<Vec<u32>> = batch.input_ids.to_vec2().unwrap();
    assert_eq!(ids[0], vec![CLS, 4, 3, SEP]);
}
