//! Script-variant expansion for query terms.
//!
//! The corpus mixes traditional and simplified characters, so a query is
//! searched under every orthography it converts to. Conversion sits behind
//! [`ScriptConverter`]; the built-in [`CharTable`] maps single characters
//! and can be extended from a tab-separated pairs file.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Converts text between writing-system variants.
pub trait ScriptConverter {
    fn to_traditional(&self, text: &str) -> String;
    fn to_simplified(&self, text: &str) -> String;
}

/// Unambiguous simplified→traditional pairs, two characters per entry.
/// Characters whose simplified form stands for several traditional ones
/// in classical usage (云, 余, 后, 干, 里, 并, 范, 征, 着, 谷 …) are left out.
static PAIRS: &str = "\
万萬与與专專业業东東丝絲两兩严嚴丧喪丰豐临臨丽麗举舉义義乐樂习習书書买買乱亂争爭亏虧亚亞\
产產亲親亿億仅僅从從仑侖仓倉仪儀们們价價众眾优優会會伟偉传傳伤傷伦倫伪偽体體佣傭侠俠侣侶\
侦偵侧側侨僑俭儉债債倾傾偿償储儲儿兒兑兌党黨兰蘭关關兴興养養兽獸内內冈岡册冊军軍农農冯馮\
决決况況冻凍净淨凉涼减減凤鳳凭憑凯凱击擊刘劉则則刚剛创創删刪别別剑劍剧劇劝勸办辦务務动動\
励勵劲勁劳勞势勢勋勳区區医醫华華协協单單卖賣卢盧卫衛却卻厅廳历歷压壓厌厭县縣参參双雙发發\
变變叙敘叶葉号號叹嘆吓嚇吕呂吴吳启啟员員听聽呜嗚咏詠响響问問园園围圍国國图圖圣聖场場坏壞\
块塊坚堅坛壇坟墳垒壘执執堕墮墙牆壮壯声聲处處备備复復头頭夹夾夺奪奋奮奖獎妇婦娄婁学學宁寧\
宝寶实實宠寵审審宪憲宫宮宽寬宾賓对對寻尋导導寿壽将將尔爾尘塵尝嘗尧堯层層属屬岁歲岂豈岛島\
岭嶺峡峽币幣师師帐帳带帶帮幫广廣庆慶库庫应應庙廟废廢开開异異张張弥彌弹彈归歸录錄彻徹径徑\
忆憶忧憂怀懷态態总總恋戀恶惡悬懸惊驚惧懼惨慘惯慣愤憤愿願戏戲战戰户戶扑撲扩擴扫掃扬揚报報\
护護担擔拟擬拥擁择擇挂掛挥揮损損换換据據携攜摄攝摆擺敌敵数數断斷无無旧舊时時显顯晋晉晓曉\
暂暫术術机機杀殺杂雜权權条條来來杨楊极極构構枪槍标標栏欄树樹样樣桥橋梦夢检檢楼樓欢歡欧歐\
残殘毕畢气氣汉漢汤湯沟溝没沒泪淚泽澤洁潔浅淺测測济濟浑渾涛濤润潤涨漲渐漸温溫湾灣满滿滥濫\
灭滅灯燈灵靈灾災炉爐点點炼煉烛燭烟煙热熱爱愛爷爺牵牽犹猶状狀独獨狱獄猎獵献獻环環现現电電\
画畫畅暢疗療盏盞盐鹽监監盖蓋盘盤矫矯础礎确確祸禍离離种種积積称稱穷窮窃竊竞競笔筆节節类類\
粮糧紧緊红紅约約级級纪紀纯純纲綱纳納纸紙线線练練组組细細织織终終经經结結绕繞绘繪给給络絡\
绝絕统統继繼续續维維综綜绿綠编編缘緣网網罗羅罚罰罢罷翘翹耻恥职職联聯肃肅胜勝脉脈脑腦脚腳\
脸臉腊臘舰艦艺藝芦蘆苏蘇茎莖荐薦药藥获獲莱萊营營萧蕭蓝藍虏虜虑慮虚虛虫蟲虽雖蚀蝕蛮蠻补補\
衬襯袭襲见見观觀规規视視览覽觉覺计計订訂认認讨討让讓训訓议議讯訊记記讲講许許论論设設访訪\
证證评評识識诉訴诊診词詞译譯试試诗詩诚誠话話诞誕询詢该該详詳语語误誤说說请請诸諸读讀课課\
谁誰调調谈談谋謀谓謂谢謝贝貝负負贡貢财財责責贤賢败敗货貨质質贩販贪貪贫貧购購贯貫贵貴贷貸\
费費贺賀资資赋賦赏賞赐賜赖賴赞贊赵趙赶趕跃躍践踐踪蹤车車轨軌转轉轮輪软軟轻輕载載较較辆輛\
辈輩辉輝输輸辞辭边邊辽遼达達迁遷过過运運还還这這进進远遠违違连連迟遲选選逊遜递遞遗遺邓鄧\
邮郵邻鄰郑鄭酱醬释釋鉴鑒针針钟鐘钱錢铁鐵银銀铜銅错錯锦錦键鍵长長门門闭閉闲閒间間闻聞阅閱\
队隊阳陽阴陰阵陣阶階际際陆陸陈陳险險随隨隐隱难難雾霧静靜韦韋韩韓页頁顶頂项項顺順须須顾顧\
顿頓预預领領颇頗频頻题題颜顏额額风風飞飛饥飢饭飯饮飲饰飾饱飽馆館马馬驱驅驳駁驻駐验驗骑騎\
鱼魚鲁魯鲜鮮鸟鳥鸡雞鸣鳴鹤鶴黄黃齐齊龙龍龟龜礼禮诏詔谥諡孙孫韵韻杰傑亩畝";

/// Character-level converter built from simplified/traditional pairs.
#[derive(Debug, Clone, Default)]
pub struct CharTable {
    s2t: HashMap<char, char>,
    t2s: HashMap<char, char>,
}

impl CharTable {
    pub fn builtin() -> Self {
        let chars: Vec<char> = PAIRS.chars().collect();
        let mut table = Self::default();
        for pair in chars.chunks_exact(2) {
            table.insert(pair[0], pair[1]);
        }
        table
    }

    /// The first pair for a character wins in each direction.
    pub fn insert(&mut self, simplified: char, traditional: char) {
        self.s2t.entry(simplified).or_insert(traditional);
        self.t2s.entry(traditional).or_insert(simplified);
    }

    /// Add pairs from a file of `simplified<TAB>traditional` lines.
    /// Lines that are not two single characters are skipped. Pairs from
    /// the file take precedence over the built-in ones.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut added = 0;
        for (idx, line) in content.lines().enumerate() {
            let mut fields = line.split('\t').map(str::trim);
            let (Some(s), Some(t)) = (fields.next(), fields.next()) else {
                continue;
            };
            let (mut s_chars, mut t_chars) = (s.chars(), t.chars());
            match (s_chars.next(), s_chars.next(), t_chars.next(), t_chars.next()) {
                (Some(s), None, Some(t), None) => {
                    self.s2t.insert(s, t);
                    self.t2s.insert(t, s);
                    added += 1;
                }
                _ => debug!(line = idx + 1, "skipping malformed variant pair"),
            }
        }
        info!(path = %path.display(), pairs = added, "loaded variant table");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.s2t.len()
    }
}

impl ScriptConverter for CharTable {
    fn to_traditional(&self, text: &str) -> String {
        text.chars().map(|c| *self.s2t.get(&c).unwrap_or(&c)).collect()
    }

    fn to_simplified(&self, text: &str) -> String {
        text.chars().map(|c| *self.t2s.get(&c).unwrap_or(&c)).collect()
    }
}

/// The trimmed term plus its traditional and simplified forms, deduplicated,
/// empties dropped, sorted by code point.
pub fn expand_variants(term: &str, converter: &dyn ScriptConverter) -> Vec<String> {
    let term = term.trim();
    let variants: BTreeSet<String> = [
        term.to_string(),
        converter.to_traditional(term),
        converter.to_simplified(term),
    ]
    .into_iter()
    .filter(|v| !v.is_empty())
    .collect();
    variants.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pairs_are_even() {
        assert_eq!(PAIRS.chars().count() % 2, 0);
        assert!(CharTable::builtin().len() > 300);
    }

    #[test]
    fn test_round_trip_directions() {
        let table = CharTable::builtin();
        assert_eq!(table.to_traditional("刘义庆"), "劉義慶");
        assert_eq!(table.to_simplified("劉義慶"), "刘义庆");
        // Unmapped characters pass through
        assert_eq!(table.to_traditional("天下"), "天下");
    }

    #[test]
    fn test_expand_variants_sorted_and_deduped() {
        let table = CharTable::builtin();
        let variants = expand_variants(" 学而 ", &table);
        assert_eq!(variants, vec!["学而".to_string(), "學而".to_string()]);

        let same = expand_variants("天下", &table);
        assert_eq!(same, vec!["天下".to_string()]);
    }

    #[test]
    fn test_expand_variants_mixed_script() {
        let table = CharTable::builtin();
        let variants = expand_variants("學习", &table);
        assert_eq!(variants.len(), 3);
        assert!(variants.contains(&"學習".to_string()));
        assert!(variants.contains(&"学习".to_string()));
        assert!(variants.contains(&"學习".to_string()));
    }

    #[test]
    fn test_expand_variants_empty() {
        assert!(expand_variants("   ", &CharTable::builtin()).is_empty());
    }

    #[test]
    fn test_extend_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pairs.tsv");
        std::fs::write(&path, "云\t雲\nbad line\n後后\t後\n").unwrap();
        let mut table = CharTable::builtin();
        assert_eq!(table.extend_from_file(&path).unwrap(), 1);
        assert_eq!(table.to_traditional("云"), "雲");
    }

    struct Upper;

    impl ScriptConverter for Upper {
        fn to_traditional(&self, text: &str) -> String {
            text.to_uppercase()
        }
        fn to_simplified(&self, text: &str) -> String {
            text.to_lowercase()
        }
    }

    #[test]
    fn test_expand_with_custom_converter() {
        assert_eq!(expand_variants("Ab", &Upper), vec!["AB", "Ab", "ab"]);
    }
}
