//! Tokenizer wrapper used to build trace inputs.

use std::fmt;
use std::path::Path;

use anyhow::anyhow;
use tokenizers::decoders::byte_level::ByteLevel as ByteLevelDecoder;
use tokenizers::models::bpe::BPE;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::{AddedToken, Tokenizer};

use crate::error::{ExportError, ExportResult};

pub const EOS_TOKEN: &str = "</s>";
pub const UNK_TOKEN: &str = "<unk>";

/// BART special tokens, matched whole before BPE runs.
pub const SPECIAL_TOKENS: &[&str] = &["<s>", "<pad>", EOS_TOKEN, UNK_TOKEN, "<mask>"];

/// A `tokenizers::Tokenizer` with the lookups export needs.
#[derive(Clone)]
pub struct ExportTokenizer {
    inner: Tokenizer,
}

impl fmt::Debug for ExportTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportTokenizer")
            .field("vocab_size", &self.inner.get_vocab_size(true))
            .finish()
    }
}

impl ExportTokenizer {
    pub fn new(inner: Tokenizer) -> Self {
        Self { inner }
    }

    /// Loads `<model_dir>/tokenizer.json`.
    pub fn from_model_dir(model_dir: &Path) -> ExportResult<Self> {
        let path = model_dir.join("tokenizer.json");
        let inner = Tokenizer::from_file(&path)
            .map_err(|e| ExportError::load_failed(format!("tokenizer {:?}", path), anyhow!(e)))?;

        log::info!(
            "Loaded tokenizer from {:?} ({} tokens)",
            path,
            inner.get_vocab_size(true)
        );
        Ok(Self { inner })
    }

    /// Builds a byte-level BPE tokenizer from `vocab.json` and `merges.txt`.
    pub fn from_bpe_files(vocab_path: &Path, merges_path: &Path) -> ExportResult<Self> {
        let what = || format!("BPE tokenizer {:?} + {:?}", vocab_path, merges_path);

        for path in [vocab_path, merges_path] {
            if !path.is_file() {
                return Err(ExportError::load_failed(
                    what(),
                    anyhow!("{:?} not found", path),
                ));
            }
        }

        let vocab = vocab_path
            .to_str()
            .ok_or_else(|| ExportError::load_failed(what(), anyhow!("non UTF-8 vocab path")))?;
        let merges = merges_path
            .to_str()
            .ok_or_else(|| ExportError::load_failed(what(), anyhow!("non UTF-8 merges path")))?;

        let bpe = BPE::from_file(vocab, merges)
            .unk_token(UNK_TOKEN.to_string())
            .build()
            .map_err(|e| ExportError::load_failed(what(), anyhow!(e)))?;

        let mut inner = Tokenizer::new(bpe);
        // add_prefix_space off: the first word carries no leading Ġ
        inner.with_pre_tokenizer(Some(ByteLevel::new(false, true, true)));
        inner.with_decoder(Some(ByteLevelDecoder::default()));

        let specials: Vec<AddedToken> = SPECIAL_TOKENS
            .iter()
            .map(|t| AddedToken::from(t.to_string(), true))
            .collect();
        inner.add_special_tokens(&specials);

        log::info!("Built {} ({} tokens)", what(), inner.get_vocab_size(true));
        Ok(Self { inner })
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    pub fn eos_token_id(&self) -> ExportResult<u32> {
        self.token_to_id(EOS_TOKEN)
            .ok_or_else(|| ExportError::UnknownToken(EOS_TOKEN.to_string()))
    }

    /// Id of `token`, or of `<unk>` when the vocabulary lacks it.
    pub fn token_to_id_or_unk(&self, token: &str) -> ExportResult<u32> {
        self.token_to_id(token)
            .or_else(|| self.token_to_id(UNK_TOKEN))
            .ok_or_else(|| ExportError::UnknownToken(token.to_string()))
    }

    /// Encodes without special tokens, keeping at most `max_length` ids.
    pub fn encode(&self, text: &str, max_length: usize) -> ExportResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| ExportError::Encode(anyhow!(e)))?;

        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > max_length {
            log::debug!("truncating input from {} to {} tokens", ids.len(), max_length);
            ids.truncate(max_length);
        }
        Ok(ids)
    }

    pub fn inner(&self) -> &Tokenizer {
        &self.inner
    }
}
