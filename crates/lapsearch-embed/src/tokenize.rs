use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{EncodeInput, Tokenizer};

/// Right-padded model inputs for one batch, each shaped [B,T].
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

pub fn pad_token_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

/// Encodes single texts or (query, document) pairs, truncating to `max_len`
/// and padding to the longest row.
pub fn encode_batch<'s, E>(tokenizer: &Tokenizer, inputs: Vec<E>, max_len: usize, device: &Device) -> Result<EncodedBatch>
where
    E: Into<EncodeInput<'s>>,
{
    let pad = pad_token_id(tokenizer);
    let mut rows = Vec::with_capacity(inputs.len());
    for input in inputs {
        let enc = tokenizer.encode(input, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        let mut types = enc.get_type_ids().to_vec();
        if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); types.truncate(max_len); }
        rows.push((ids, mask, types));
    }
    let batch = rows.len();
    let width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max(1);
    let (mut ids, mut mask, mut types) = (Vec::with_capacity(batch * width), Vec::with_capacity(batch * width), Vec::with_capacity(batch * width));
    for (i, m, t) in rows {
        let pad_n = width - i.len();
        ids.extend(i); ids.extend(std::iter::repeat(pad).take(pad_n));
        mask.extend(m); mask.extend(std::iter::repeat(0).take(pad_n));
        types.extend(t); types.extend(std::iter::repeat(0).take(pad_n));
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, width), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, width), device)?,
        token_type_ids: Tensor::from_vec(types, (batch, width), device)?,
    })
}
